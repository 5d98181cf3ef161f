use clap::{Args, Parser, Subcommand};
use clinic_core::db::open_db;
use clinic_core::{
    format_masked, init_logging, validate_document, RegistryConfig, SqliteTenantRepository,
    TenantService,
};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "clinic", about = "Patient registry CLI", version, long_about = None)]
pub(crate) struct Cli {
    /// SQLite database file; overrides CLINIC_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the initial clinic if it does not exist
    Bootstrap(BootstrapArgs),
    /// List clinics
    Tenants(TenantsArgs),
    /// Validate a CPF, with or without mask
    CheckCpf(CheckCpfArgs),
}

#[derive(Debug, Args)]
struct BootstrapArgs {
    /// Clinic slug; overrides INITIAL_CLINIC_SLUG
    #[arg(long)]
    slug: Option<String>,

    /// Clinic display name; overrides INITIAL_CLINIC_NAME
    #[arg(long)]
    name: Option<String>,
}

#[derive(Debug, Args)]
struct TenantsArgs {
    /// Include inactive clinics
    #[arg(long)]
    all: bool,
}

#[derive(Debug, Args)]
struct CheckCpfArgs {
    value: String,
}

impl Cli {
    pub(crate) fn run(self) -> Result<(), String> {
        let mut config = RegistryConfig::from_env().map_err(|error| error.to_string())?;
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(log_dir) = config.log_dir.as_ref() {
            init_logging(&config.log_level, log_dir)
                .map_err(|error| format!("failed to initialize logging: {error}"))?;
        }

        match self.command {
            Commands::Bootstrap(args) => bootstrap(&config, args),
            Commands::Tenants(args) => tenants(&config, args),
            Commands::CheckCpf(args) => check_cpf(&args.value),
        }
    }
}

fn bootstrap(config: &RegistryConfig, args: BootstrapArgs) -> Result<(), String> {
    let slug = args.slug.unwrap_or_else(|| config.initial_tenant.slug.clone());
    let name = args.name.unwrap_or_else(|| config.initial_tenant.name.clone());

    let conn = open_db(&config.db_path)
        .map_err(|error| format!("failed to open database: {error}"))?;
    let repo = SqliteTenantRepository::try_new(&conn).map_err(|error| error.to_string())?;
    let provisioning = TenantService::new(repo)
        .ensure_initial_tenant(&slug, &name)
        .map_err(|error| format!("failed to provision clinic: {error}"))?;

    let tenant = provisioning.tenant;
    if provisioning.created {
        println!("Created initial clinic: {} ({})", tenant.name, tenant.slug);
    } else {
        println!("Clinic '{}' already exists.", tenant.slug);
    }
    println!("tenant_id: {}", tenant.id);
    info!("event=cli_bootstrap module=cli status=ok created={}", provisioning.created);
    Ok(())
}

fn tenants(config: &RegistryConfig, args: TenantsArgs) -> Result<(), String> {
    let conn = open_db(&config.db_path)
        .map_err(|error| format!("failed to open database: {error}"))?;
    let repo = SqliteTenantRepository::try_new(&conn).map_err(|error| error.to_string())?;
    let tenants = TenantService::new(repo)
        .list_tenants(args.all)
        .map_err(|error| format!("failed to list clinics: {error}"))?;

    for tenant in tenants {
        let state = if tenant.active { "active" } else { "inactive" };
        println!("{}\t{}\t{}\t{}", tenant.id, tenant.slug, state, tenant.name);
    }
    Ok(())
}

fn check_cpf(value: &str) -> Result<(), String> {
    validate_document(value).map_err(|error| error.to_string())?;
    match format_masked(value) {
        Some(masked) => println!("valid: {masked}"),
        None => println!("blank: no CPF given"),
    }
    Ok(())
}
