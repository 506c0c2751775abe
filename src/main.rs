use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use linesheet::core::db::{PersistenceAdapter, SqliteDocumentStore};
use linesheet::imaging::decode_data_uri;
use linesheet::{
    CatalogConfig, CatalogStore, JpegDataUriEncoder, MoveDirection, ProductUpdate,
    ProjectDetailsUpdate,
};

type Store = CatalogStore<SqliteDocumentStore, JpegDataUriEncoder>;

#[derive(Parser)]
#[command(name = "linesheet")]
#[command(about = "Manage line sheet catalogs of products and images")]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Document database (overrides the config file)
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all projects, newest first
    List,
    /// Create an empty project
    Create { name: String },
    /// Print a project and its products
    Show { project: String },
    /// Delete a project and all its products
    Delete { project: String },
    /// Update project header details
    SetDetails {
        project: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        designer: Option<String>,
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Set the project logo, or clear it when no image is given
    SetLogo {
        project: String,
        image: Option<PathBuf>,
    },
    /// Replace all products with the records of a CSV file
    ImportCsv { project: String, file: PathBuf },
    /// Append a blank product
    AddProduct { project: String },
    /// Update the text fields of a product
    SetProduct {
        project: String,
        product: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        tax: Option<String>,
    },
    /// Delete a product
    DeleteProduct { project: String, product: String },
    /// Move a product one position up or down
    MoveProduct {
        project: String,
        index: usize,
        direction: MoveDirection,
    },
    /// Attach images to a product
    AddImages {
        project: String,
        product: String,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Remove one image from a product
    RemoveImage {
        project: String,
        product: String,
        index: usize,
    },
    /// Write every stored image of a project to a directory
    ExportImages { project: String, dir: PathBuf },
}

/// Fails with the catalog's recorded error, if any.
async fn check(store: &Store) -> anyhow::Result<()> {
    match store.last_error().await {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

async fn open_project(store: &Store, id: &str) -> anyhow::Result<()> {
    store.select_project(id).await;
    check(store).await
}

fn non_empty(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| if v.is_empty() { None } else { Some(v) })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "linesheet=debug" } else { "linesheet=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::default(),
    };
    if let Some(database) = args.database {
        config.store.database = database;
    }

    let documents = SqliteDocumentStore::open(&config.store.database).await?;
    let adapter = PersistenceAdapter::with_collection(documents, config.store.collection.clone());
    let store = CatalogStore::new(adapter, JpegDataUriEncoder::from_config(&config.images));

    store.load_all().await;
    check(&store).await?;

    let result = run(&store, args.command).await;
    store.adapter().store().close().await?;
    result
}

async fn run(store: &Store, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List => {
            let projects = store.projects().await;
            if projects.is_empty() {
                println!("No projects.");
            }
            for project in projects {
                println!(
                    "{}  {}  ({} products, created {})",
                    project.id,
                    project.name,
                    project.products.len(),
                    project.created_at.date()
                );
            }
        }
        Command::Create { name } => match store.create_project(name).await {
            Some(id) => println!("{id}"),
            None => check(store).await?,
        },
        Command::Show { project } => {
            open_project(store, &project).await?;
            let project = store
                .current_project()
                .await
                .context("No project selected")?;
            println!("{} ({})", project.name, project.id);
            for (label, value) in [
                ("Designer", &project.designer_name),
                ("Collection", &project.collection),
                ("Phone", &project.phone),
                ("Email", &project.email),
            ] {
                if let Some(value) = value {
                    println!("{label}: {value}");
                }
            }
            if project.logo_url.is_some() {
                println!("Logo: yes");
            }
            for (i, p) in project.products.iter().enumerate() {
                println!(
                    "{i:>3}. [{}] {} | {} | {} | {} | {} | {} images | {}",
                    p.product_code,
                    p.product_name,
                    p.content,
                    p.size,
                    p.price,
                    p.tax,
                    p.images.len(),
                    p.id
                );
            }
        }
        Command::Delete { project } => {
            if !store.delete_project(&project).await {
                check(store).await?;
            }
        }
        Command::SetDetails {
            project,
            name,
            designer,
            collection,
            phone,
            email,
        } => {
            open_project(store, &project).await?;
            let update = ProjectDetailsUpdate {
                name,
                designer_name: non_empty(designer),
                collection: non_empty(collection),
                phone: non_empty(phone),
                email: non_empty(email),
                logo_url: None,
            };
            store.update_project_details(update).await;
            check(store).await?;
        }
        Command::SetLogo { project, image } => {
            open_project(store, &project).await?;
            store.update_logo(image.as_deref()).await;
            check(store).await?;
        }
        Command::ImportCsv { project, file } => {
            open_project(store, &project).await?;
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read CSV file {:?}", file))?;
            store.import_csv(&text).await;
            check(store).await?;
            let count = store.current_project().await.map_or(0, |p| p.products.len());
            println!("Imported {count} products");
        }
        Command::AddProduct { project } => {
            open_project(store, &project).await?;
            match store.add_product().await {
                Some(id) => println!("{id}"),
                None => check(store).await?,
            }
        }
        Command::SetProduct {
            project,
            product,
            code,
            name,
            content,
            size,
            price,
            tax,
        } => {
            open_project(store, &project).await?;
            let update = ProductUpdate {
                product_code: code,
                product_name: name,
                content,
                size,
                price,
                tax,
                logo_url: None,
            };
            if !store.update_product(&product, update).await {
                check(store).await?;
                anyhow::bail!("Product {product} not found");
            }
        }
        Command::DeleteProduct { project, product } => {
            open_project(store, &project).await?;
            store.delete_product(&product).await;
            check(store).await?;
        }
        Command::MoveProduct {
            project,
            index,
            direction,
        } => {
            open_project(store, &project).await?;
            if !store.move_product(index, direction).await {
                check(store).await?;
                println!("Product {index} cannot move {direction}");
            }
        }
        Command::AddImages {
            project,
            product,
            images,
        } => {
            open_project(store, &project).await?;
            store.add_images_to_product(&product, &images).await;
            check(store).await?;
        }
        Command::RemoveImage {
            project,
            product,
            index,
        } => {
            open_project(store, &project).await?;
            store.remove_image_from_product(&product, index).await;
            check(store).await?;
        }
        Command::ExportImages { project, dir } => {
            open_project(store, &project).await?;
            let project = store
                .current_project()
                .await
                .context("No project selected")?;
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {:?}", dir))?;

            let mut written = 0;
            if let Some(logo) = &project.logo_url {
                let image = decode_data_uri(logo).context("Invalid project logo")?;
                let path = dir.join(format!("logo.{}", image.extension()));
                tokio::fs::write(&path, &image.bytes).await?;
                written += 1;
            }
            for (i, product) in project.products.iter().enumerate() {
                let stem = if product.product_code.is_empty() {
                    format!("{i:03}")
                } else {
                    let code: String = product
                        .product_code
                        .chars()
                        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                        .collect();
                    format!("{i:03}-{code}")
                };
                for (n, encoded) in product.images.iter().enumerate() {
                    let image = decode_data_uri(encoded)
                        .with_context(|| format!("Invalid image {n} of product {}", product.id))?;
                    let path = dir.join(format!("{stem}-{n}.{}", image.extension()));
                    tokio::fs::write(&path, &image.bytes)
                        .await
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    written += 1;
                }
            }
            println!("Exported {written} images to {:?}", dir);
        }
    }
    Ok(())
}
