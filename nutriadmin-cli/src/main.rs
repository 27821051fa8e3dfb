//! nutriadmin - command-line console for the nutrition store backend
//!
//! Builds the session and HTTP clients once per invocation and hands them to
//! the command handlers. A rejected session ends with a hint to log in again.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use nutriadmin_client::{AdminFilter, ApiClients, Catalog, ClientError};
use nutriadmin_core::logging::performance::measure_async;
use nutriadmin_core::{init_logging, redact_secret, AdminConfig, LoggingConfig, NutriError};
use nutriadmin_forms::{admin_registration, client_registration, product_form, FormError, Wizard};
use nutriadmin_session::{FileCookieJar, SessionConfig, SessionError, SessionService};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "nutriadmin")]
#[command(about = "Administration console for the nutrition store backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend address, overrides file and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Status,

    /// Administrator accounts
    Admins {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Client accounts
    Clients {
        #[command(subcommand)]
        command: ClientCommands,
    },

    /// Product inventory
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Categories, sizes and flavors
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Image storage
    Images {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List administrators
    List {
        /// Match names, email or DNI
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        department: Option<String>,

        /// Access level (1-5)
        #[arg(short, long)]
        level: Option<u8>,

        /// Only active (true) or inactive (false) accounts
        #[arg(long)]
        active: Option<bool>,
    },

    /// Register an administrator
    Register {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        dni: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        nombre: Option<String>,
        #[arg(long)]
        apellido_paterno: Option<String>,
        #[arg(long)]
        apellido_materno: Option<String>,
        #[arg(long)]
        departamento: Option<String>,
        /// Access level (1-5)
        #[arg(long)]
        nivel_acceso: Option<String>,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Register a client
    Register {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        nombre: Option<String>,
        #[arg(long)]
        apellidos: Option<String>,
        #[arg(long)]
        telefono: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProductCommands {
    List,

    Get { id: String },

    /// Create a product, optionally uploading its image first
    Create {
        #[arg(long)]
        nombre: Option<String>,
        #[arg(long)]
        descripcion: Option<String>,
        #[arg(long)]
        categoria: Option<String>,
        #[arg(long)]
        precio: Option<String>,
        #[arg(long)]
        stock: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },

    Delete { id: String },
}

#[derive(Subcommand)]
enum CatalogCommands {
    List { kind: CatalogKind },
    Add { kind: CatalogKind, nombre: String },
    Remove { kind: CatalogKind, id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum CatalogKind {
    Categories,
    Sizes,
    Flavors,
}

impl From<CatalogKind> for Catalog {
    fn from(kind: CatalogKind) -> Self {
        match kind {
            CatalogKind::Categories => Catalog::Categories,
            CatalogKind::Sizes => Catalog::Sizes,
            CatalogKind::Flavors => Catalog::Flavors,
        }
    }
}

#[derive(Subcommand)]
enum ImageCommands {
    Upload {
        path: PathBuf,

        /// Target folder in storage
        #[arg(short, long)]
        folder: Option<String>,
    },

    Delete { id: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let unauthorized = e
            .downcast_ref::<ClientError>()
            .is_some_and(ClientError::is_unauthorized);
        let message = format!("{:#}", e);
        let core = core_error(e);
        if let Some(core) = &core {
            core.log();
        }

        if unauthorized {
            eprintln!("Session expired or not logged in. Run `nutriadmin login` to sign in again.");
        } else {
            eprintln!("Error: {}", message);
            if core.as_ref().is_some_and(NutriError::is_recoverable) {
                eprintln!("The backend is unreachable or busy. Try again shortly.");
            }
        }
        std::process::exit(1);
    }
}

/// The library error behind a failure, as the shared core error
fn core_error(error: anyhow::Error) -> Option<NutriError> {
    let error = match error.downcast::<ClientError>() {
        Ok(e) => return Some(e.into()),
        Err(error) => error,
    };
    let error = match error.downcast::<SessionError>() {
        Ok(e) => return Some(e.into()),
        Err(error) => error,
    };
    error.downcast::<NutriError>().ok()
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AdminConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        config.logging.clone()
    };
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting nutriadmin v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Config {
        show,
        init,
        validate,
    } = cli.command
    {
        return handle_config(&config, cli.config.as_deref(), show, init, validate);
    }

    config.validate()?;
    let clients = build_clients(&config)?;

    match cli.command {
        Commands::Login { email, password } => handle_login(&clients, &email, password).await,
        Commands::Logout => handle_logout(&clients),
        Commands::Status => handle_status(&clients, &config),
        Commands::Admins { command } => handle_admins(&clients, command).await,
        Commands::Clients { command } => handle_clients(&clients, command).await,
        Commands::Products { command } => handle_products(&clients, command).await,
        Commands::Catalog { command } => handle_catalog(&clients, command).await,
        Commands::Images { command } => handle_images(&clients, command).await,
        Commands::Config { .. } => Ok(()),
    }
}

/// Session and both HTTP clients, wired to the persisted cookie jar
fn build_clients(config: &AdminConfig) -> anyhow::Result<ApiClients> {
    let cookie_file = config.session.resolved_cookie_file();
    let jar = FileCookieJar::open(&cookie_file)
        .with_context(|| format!("Failed to open cookie jar at {}", cookie_file.display()))?
        .with_scope(config.session.path.clone());
    debug!(path = %cookie_file.display(), "Using cookie jar");

    let session = Arc::new(SessionService::new(
        Arc::new(jar),
        SessionConfig::from_admin_config(config),
    ));
    Ok(ApiClients::new(config, session)?)
}

async fn handle_login(
    clients: &ApiClients,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };

    let user = measure_async("login", clients.auth().login(email, &password)).await?;
    println!("Logged in as {}", user.display_name());
    Ok(())
}

fn handle_logout(clients: &ApiClients) -> anyhow::Result<()> {
    clients.auth().logout()?;
    println!("Logged out");
    Ok(())
}

fn handle_status(clients: &ApiClients, config: &AdminConfig) -> anyhow::Result<()> {
    let session = clients.session().snapshot()?;
    println!("Backend: {}", config.api.base_url);

    match (&session.token, &session.user) {
        (Some(token), Some(user)) => {
            println!("Logged in as {} ({})", user.display_name(), user.id);
            println!("Token: {}", redact_secret(token));
        }
        (Some(_), None) | (None, Some(_)) => {
            println!("Incomplete session, run `nutriadmin login`");
        }
        (None, None) => println!("Not logged in"),
    }
    Ok(())
}

async fn handle_admins(clients: &ApiClients, command: AdminCommands) -> anyhow::Result<()> {
    match command {
        AdminCommands::List {
            search,
            department,
            level,
            active,
        } => {
            let filter = AdminFilter {
                search,
                department,
                access_level: level,
                active,
            };
            let admins = clients.auth().find_admins(&filter).await?;

            if admins.is_empty() {
                println!("No administrators found");
            }
            for admin in &admins {
                println!(
                    "{:<26} {:<32} {:<16} nivel {}{}",
                    admin.full_name(),
                    admin.email,
                    admin.departamento.as_deref().unwrap_or("-"),
                    admin
                        .nivel_acceso
                        .map(|l| l.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    if admin.activo == Some(false) {
                        " (inactive)"
                    } else {
                        ""
                    }
                );
            }
            Ok(())
        }
        AdminCommands::Register {
            email,
            dni,
            password,
            nombre,
            apellido_paterno,
            apellido_materno,
            departamento,
            nivel_acceso,
        } => {
            let mut wizard = admin_registration();
            let payload = run_wizard(
                &mut wizard,
                &[
                    ("email", email),
                    ("dni", dni),
                    ("password", password),
                    ("nombre", nombre),
                    ("apellidoPaterno", apellido_paterno),
                    ("apellidoMaterno", apellido_materno),
                    ("departamento", departamento),
                    ("nivelAcceso", nivel_acceso),
                ],
            )?;

            let created = clients.auth().register_admin(&payload).await?;
            println!("Administrator registered: {}", describe(&created));
            Ok(())
        }
    }
}

async fn handle_clients(clients: &ApiClients, command: ClientCommands) -> anyhow::Result<()> {
    match command {
        ClientCommands::Register {
            email,
            password,
            nombre,
            apellidos,
            telefono,
        } => {
            let mut wizard = client_registration();
            let payload = run_wizard(
                &mut wizard,
                &[
                    ("email", email),
                    ("password", password),
                    ("nombre", nombre),
                    ("apellidos", apellidos),
                    ("telefono", telefono),
                ],
            )?;

            let created = clients.auth().register_client(&payload).await?;
            println!("Client registered: {}", describe(&created));
            Ok(())
        }
    }
}

async fn handle_products(clients: &ApiClients, command: ProductCommands) -> anyhow::Result<()> {
    let inventory = clients.inventory();
    match command {
        ProductCommands::List => {
            let products = measure_async("list_products", inventory.list_products()).await?;
            for product in &products {
                println!(
                    "{:<10} {:<32} {:>10} {:>6}",
                    product.id,
                    product.nombre,
                    product
                        .precio
                        .map(|p| format!("{:.2}", p))
                        .unwrap_or_else(|| "-".to_string()),
                    product
                        .stock
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            println!("{} product(s)", products.len());
        }
        ProductCommands::Get { id } => {
            let product = inventory.get_product(&id).await?;
            println!("{}", serde_json::to_string_pretty(&product)?);
        }
        ProductCommands::Create {
            nombre,
            descripcion,
            categoria,
            precio,
            stock,
            image,
        } => {
            let mut wizard = product_form();
            let mut payload = run_wizard(
                &mut wizard,
                &[
                    ("nombre", nombre),
                    ("descripcion", descripcion),
                    ("categoriaId", categoria),
                    ("precio", precio),
                    ("stock", stock),
                ],
            )?;

            // validate before uploading so a bad form leaves no orphan image
            if let Some(path) = image {
                let uploaded = upload(clients, &path, Some("productos")).await?;
                payload.insert("imagenUrl".to_string(), Value::String(uploaded));
            }

            let product = inventory.create_product(&payload).await?;
            println!("Product created: {} ({})", product.nombre, product.id);
        }
        ProductCommands::Delete { id } => {
            inventory.delete_product(&id).await?;
            println!("Product {} deleted", id);
        }
    }
    Ok(())
}

async fn handle_catalog(clients: &ApiClients, command: CatalogCommands) -> anyhow::Result<()> {
    let inventory = clients.inventory();
    match command {
        CatalogCommands::List { kind } => {
            for item in inventory.list_catalog(kind.into()).await? {
                println!("{:<10} {}", item.id, item.nombre);
            }
        }
        CatalogCommands::Add { kind, nombre } => {
            let catalog: Catalog = kind.into();
            let item = inventory.create_catalog_item(catalog, &nombre).await?;
            println!("Added to {}: {} ({})", catalog.label(), item.nombre, item.id);
        }
        CatalogCommands::Remove { kind, id } => {
            let catalog: Catalog = kind.into();
            inventory.delete_catalog_item(catalog, &id).await?;
            println!("Removed {} from {}", id, catalog.label());
        }
    }
    Ok(())
}

async fn handle_images(clients: &ApiClients, command: ImageCommands) -> anyhow::Result<()> {
    match command {
        ImageCommands::Upload { path, folder } => {
            let url = upload(clients, &path, folder.as_deref()).await?;
            println!("{}", url);
        }
        ImageCommands::Delete { id } => {
            clients.storage().delete_image(&id).await?;
            println!("Image {} deleted", id);
        }
    }
    Ok(())
}

async fn upload(clients: &ApiClients, path: &Path, folder: Option<&str>) -> anyhow::Result<String> {
    let uploaded = measure_async("upload_image", clients.storage().upload_file(path, folder))
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;
    Ok(uploaded.url)
}

fn handle_config(
    config: &AdminConfig,
    path: Option<&Path>,
    show: bool,
    init: bool,
    validate: bool,
) -> anyhow::Result<()> {
    if init {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(AdminConfig::default_path);
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        AdminConfig::default().save_to_file(&path)?;
        println!("Configuration initialized at: {}", path.display());
    }

    if show {
        println!("{}", toml::to_string_pretty(config)?);
    }

    if validate {
        config.validate()?;
        println!("Configuration is valid");
    }

    Ok(())
}

/// Feed flag values into the wizard and walk it to submission.
///
/// Stops at the first step that fails and reports its field errors.
fn run_wizard(
    wizard: &mut Wizard,
    values: &[(&str, Option<String>)],
) -> anyhow::Result<Map<String, Value>> {
    for (field, value) in values {
        if let Some(value) = value {
            wizard.set_field(field, value.as_str())?;
        }
    }

    while !wizard.is_last_step() {
        let title = wizard.current_step().title.clone();
        if let Err(e) = wizard.next() {
            report_form_error(&title, &e);
            bail!("{} step is invalid", title);
        }
    }

    match wizard.submit() {
        Ok(payload) => Ok(payload),
        Err(e) => {
            let titles: Vec<String> = wizard
                .steps_with_errors()
                .into_iter()
                .map(|i| wizard.steps()[i].title.clone())
                .collect();
            report_form_error(&titles.join(", "), &e);
            bail!("form is invalid")
        }
    }
}

fn report_form_error(step: &str, error: &FormError) {
    match error.validation_errors() {
        Some(errors) => {
            eprintln!("{}:", step);
            for (field, messages) in errors.iter() {
                for message in messages {
                    eprintln!("  --{}: {}", flag_name(field), message);
                }
            }
        }
        None => eprintln!("{}: {}", step, error),
    }
}

/// `apellidoPaterno` -> `apellido-paterno`
fn flag_name(field: &str) -> String {
    match field {
        "categoriaId" => "categoria".to_string(),
        _ => field
            .chars()
            .flat_map(|c| {
                if c.is_ascii_uppercase() {
                    vec!['-', c.to_ascii_lowercase()]
                } else {
                    vec![c]
                }
            })
            .collect(),
    }
}

fn describe(created: &Value) -> String {
    let id = created
        .get("id")
        .or_else(|| created.get("_id"))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    let email = created.get("email").and_then(Value::as_str);
    match (email, id) {
        (Some(email), Some(id)) => format!("{} ({})", email, id),
        (Some(email), None) => email.to_string(),
        (None, Some(id)) => id,
        (None, None) => "ok".to_string(),
    }
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}
