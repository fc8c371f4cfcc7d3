//! `taxi` - CLI for the taxi fleet records
//!
//! This binary signs in with `--user`/`--password` and runs one fleet
//! operation per invocation against the configured database.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;

use taxi::cli::{
    car_update, driver_update, license_update, list_query, manufacturer_update, CarCommand, Cli,
    Command, ConfigCommand, DriverCommand, ManufacturerCommand, OutputFormat, PlainText,
};
use taxi::forms::{CarForm, ManufacturerForm};
use taxi::{init_logging, Config, Principal, Storage, Views};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    if let Command::Config(cmd) = cli.command {
        return handle_config(&config, cli.format, cmd);
    }

    let database_path = config.database_path();
    let storage = Storage::open(&database_path)
        .with_context(|| format!("failed to open database {}", database_path.display()))?;
    let views = Views::from_config(storage, &config);

    let principal = sign_in(&views, &cli)?;
    let principal = principal.as_ref();
    let format = cli.format;

    let result = match cli.command {
        Command::Home => views
            .home(principal)
            .map_err(anyhow::Error::from)
            .and_then(|counts| emit(format, &counts)),
        Command::Manufacturer(cmd) => handle_manufacturer(&views, principal, format, cmd),
        Command::Driver(cmd) => handle_driver(&views, principal, format, cmd),
        Command::Car(cmd) => handle_car(&views, principal, format, cmd),
        Command::Config(_) => Ok(()),
    };

    result.map_err(|error| {
        let unauthenticated = error
            .downcast_ref::<taxi::Error>()
            .is_some_and(taxi::Error::is_unauthenticated);
        if unauthenticated {
            error.context("sign in with --user and --password (or TAXI_USER and TAXI_PASSWORD)")
        } else {
            error
        }
    })
}

fn sign_in(views: &Views, cli: &Cli) -> anyhow::Result<Option<Principal>> {
    let Some((username, password)) = cli.credentials() else {
        return Ok(None);
    };
    let Some(password) = password else {
        bail!("--user {username} needs --password or TAXI_PASSWORD");
    };
    let principal = views.authenticate(username, password)?;
    tracing::info!("Signed in as {}", principal.username);
    Ok(Some(principal))
}

fn emit<T: Serialize + PlainText>(format: OutputFormat, value: &T) -> anyhow::Result<()> {
    match format {
        OutputFormat::Plain => println!("{}", value.plain_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn handle_manufacturer(
    views: &Views,
    principal: Option<&Principal>,
    format: OutputFormat,
    cmd: ManufacturerCommand,
) -> anyhow::Result<()> {
    match cmd {
        ManufacturerCommand::List { name, page } => {
            let query = list_query(name.as_deref(), &page);
            emit(format, &views.list_manufacturers(principal, &query)?)
        }
        ManufacturerCommand::Show { id } => emit(format, &views.manufacturer_detail(principal, id)?),
        ManufacturerCommand::Create { name, country } => {
            let form = ManufacturerForm { name, country };
            emit(format, &views.create_manufacturer(principal, &form)?)
        }
        ManufacturerCommand::Update { id, name, country } => {
            let current = views.manufacturer_detail(principal, id)?;
            let form = manufacturer_update(&current, name.as_deref(), country.as_deref());
            emit(format, &views.update_manufacturer(principal, id, &form)?)
        }
        ManufacturerCommand::Delete { id } => {
            views.delete_manufacturer(principal, id)?;
            println!("Deleted manufacturer {id}");
            Ok(())
        }
    }
}

fn handle_driver(
    views: &Views,
    principal: Option<&Principal>,
    format: OutputFormat,
    cmd: DriverCommand,
) -> anyhow::Result<()> {
    match cmd {
        DriverCommand::List { username, page } => {
            let query = list_query(username.as_deref(), &page);
            emit(format, &views.list_drivers(principal, &query)?)
        }
        DriverCommand::Show { id } => emit(format, &views.driver_detail(principal, id)?),
        DriverCommand::Create(args) => {
            emit(format, &views.create_driver(principal, &args.to_form())?)
        }
        DriverCommand::Register(args) => emit(format, &views.register(&args.to_form())?),
        DriverCommand::Update {
            id,
            username,
            first_name,
            last_name,
            license_number,
        } => {
            let current = views.driver_detail(principal, id)?.driver;
            let form = driver_update(
                &current,
                username.as_deref(),
                first_name.as_deref(),
                last_name.as_deref(),
                license_number.as_deref(),
            );
            emit(format, &views.update_driver(principal, id, &form)?)
        }
        DriverCommand::License { id, license_number } => {
            let form = license_update(&license_number);
            emit(format, &views.update_license(principal, id, &form)?)
        }
        DriverCommand::Delete { id } => {
            views.delete_driver(principal, id)?;
            println!("Deleted driver {id}");
            Ok(())
        }
    }
}

fn handle_car(
    views: &Views,
    principal: Option<&Principal>,
    format: OutputFormat,
    cmd: CarCommand,
) -> anyhow::Result<()> {
    match cmd {
        CarCommand::List { model, page } => {
            let query = list_query(model.as_deref(), &page);
            emit(format, &views.list_cars(principal, &query)?)
        }
        CarCommand::Show { id } => emit(format, &views.car_detail(principal, id)?),
        CarCommand::Create {
            model,
            manufacturer,
            drivers,
        } => {
            let form = CarForm {
                model,
                manufacturer: Some(manufacturer),
                drivers,
            };
            emit(format, &views.create_car(principal, &form)?)
        }
        CarCommand::Update {
            id,
            model,
            manufacturer,
            drivers,
            no_drivers,
        } => {
            let current = views.car_detail(principal, id)?;
            let form = car_update(&current, model.as_deref(), manufacturer, &drivers, no_drivers);
            emit(format, &views.update_car(principal, id, &form)?)
        }
        CarCommand::Delete { id } => {
            views.delete_car(principal, id)?;
            println!("Deleted car {id}");
            Ok(())
        }
        CarCommand::Assign { id } => {
            if views.toggle_assignment(principal, id)? {
                println!("Joined car {id}");
            } else {
                println!("Left car {id}");
            }
            Ok(())
        }
    }
}

fn handle_config(config: &Config, format: OutputFormat, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Plain => {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:       {}", config.database_path().display());
                println!();
                println!("[List]");
                println!("  Page size:           {}", config.list.page_size);
                println!();
                println!("[Auth]");
                println!("  Min password length: {}", config.auth.min_password_length);
            }
        },
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
