use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_PRODUCT_NAME: &str = "New Product";

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn undated() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

/// One catalog line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub tax: String,
    /// Encoded images in print order.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl Product {
    /// A product with blank fields and the default display name.
    pub fn blank() -> Self {
        Product {
            id: new_id(),
            product_code: String::new(),
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            content: String::new(),
            size: String::new(),
            price: String::new(),
            tax: String::new(),
            images: Vec::new(),
            logo_url: None,
        }
    }
}

/// A named catalog of products, the unit persisted as one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Documents written without a creation date read back as the Unix epoch.
    #[serde(with = "time::serde::rfc3339", default = "undated")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Project {
            id: new_id(),
            name: name.into(),
            created_at: OffsetDateTime::now_utc(),
            products: Vec::new(),
            designer_name: None,
            collection: None,
            phone: None,
            email: None,
            logo_url: None,
        }
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }
}

/// Partial update of a project's header metadata.
///
/// `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct ProjectDetailsUpdate {
    pub name: Option<String>,
    pub designer_name: Option<Option<String>>,
    pub collection: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub logo_url: Option<Option<String>>,
}

impl ProjectDetailsUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.designer_name.is_none()
            && self.collection.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.logo_url.is_none()
    }

    pub(crate) fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(designer_name) = self.designer_name {
            project.designer_name = designer_name;
        }
        if let Some(collection) = self.collection {
            project.collection = collection;
        }
        if let Some(phone) = self.phone {
            project.phone = phone;
        }
        if let Some(email) = self.email {
            project.email = email;
        }
        if let Some(logo_url) = self.logo_url {
            project.logo_url = logo_url;
        }
    }
}

/// Partial update of a product. Identity and images are not reachable here.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub content: Option<String>,
    pub size: Option<String>,
    pub price: Option<String>,
    pub tax: Option<String>,
    pub logo_url: Option<Option<String>>,
}

impl ProductUpdate {
    pub(crate) fn apply(self, product: &mut Product) {
        let fields = [
            (self.product_code, &mut product.product_code),
            (self.product_name, &mut product.product_name),
            (self.content, &mut product.content),
            (self.size, &mut product.size),
            (self.price, &mut product.price),
            (self.tax, &mut product.tax),
        ];
        for (update, field) in fields {
            if let Some(value) = update {
                *field = value;
            }
        }
        if let Some(logo_url) = self.logo_url {
            product.logo_url = logo_url;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl FromStr for MoveDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(MoveDirection::Up),
            "down" => Ok(MoveDirection::Down),
            other => Err(format!("Invalid move direction: {other} (expected up or down)")),
        }
    }
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveDirection::Up => f.write_str("up"),
            MoveDirection::Down => f.write_str("down"),
        }
    }
}
