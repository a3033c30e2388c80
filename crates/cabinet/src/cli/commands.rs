//! # Dispatch
//!
//! `run()` parses arguments, installs the log subscriber, loads
//! configuration, opens the configured store and hands each command to a
//! small handler. Handlers call exactly one API method (two when an id must
//! be resolved first) and print what it returns.
//!
//! Logs go to stderr through `tracing`; set `CABINET_LOG` (e.g.
//! `CABINET_LOG=cabinetapp=debug`) or pass `-v` for debug output. Results
//! and messages go to stdout.

use super::render::Output;
use super::setup::{
    command_path, print_grouped_help, print_help_for_path, AppointmentCommands, Cli, Commands,
    ContentCommands, FileCommands, MenuCommands, PropertyCommands, PropertyFields,
    PropertyTypeCommands, ServiceCommands,
    SocialCommands, StatsCommands, StatusArgs,
};
use anyhow::{bail, Context, Result};
use cabinetapp::api::{CabinetApi, TextEdit};
use cabinetapp::commands::appointments::AppointmentRequest;
use cabinetapp::commands::menus::{MenuInput, MenuPatch};
use cabinetapp::commands::properties::{NewProperty, PropertyFilter, PropertyPatch};
use cabinetapp::commands::records::RecordStatusFilter;
use cabinetapp::commands::services::{ServiceInput, ServicePatch};
use cabinetapp::commands::social_links::{SocialLinkInput, SocialLinkPatch};
use cabinetapp::commands::stats::SearchInput;
use cabinetapp::commands::CmdResult;
use cabinetapp::config::CabinetConfig;
use cabinetapp::init::initialize_with;
use cabinetapp::model::Collection;
use cabinetapp::store::ConfiguredStore;
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "CABINET_LOG";

struct AppContext {
    api: CabinetApi<ConfiguredStore>,
    config: CabinetConfig,
    out: Output,
}

impl AppContext {
    fn print_messages<T>(&self, result: &CmdResult<T>) {
        print!("{}", self.out.messages(&result.messages));
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.help {
        print_help_for_path(&command_path(&cli.command));
        return Ok(());
    }

    init_logging(cli.verbose);

    let command = match cli.command {
        Some(Commands::Help { command }) => {
            let path: Vec<&str> = command.iter().map(String::as_str).collect();
            print_help_for_path(&path);
            return Ok(());
        }
        Some(command) => command,
        None => {
            print_grouped_help();
            return Ok(());
        }
    };

    let mut ctx = init_context(cli.data_dir)?;

    match command {
        Commands::Content(cmd) => handle_content(&mut ctx, cmd),
        Commands::Properties(cmd) => handle_properties(&mut ctx, cmd),
        Commands::Appointments(cmd) => handle_appointments(&mut ctx, cmd),
        Commands::Services(cmd) => handle_services(&mut ctx, cmd),
        Commands::Social(cmd) => handle_social(&mut ctx, cmd),
        Commands::Menus(cmd) => handle_menus(&mut ctx, cmd),
        Commands::Stats(cmd) => handle_stats(&mut ctx, cmd),
        Commands::Config { key } => handle_config(&ctx, key),
        Commands::Files(cmd) => handle_files(&mut ctx, cmd),
        Commands::Help { .. } => Ok(()),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn init_context(data_dir: Option<PathBuf>) -> Result<AppContext> {
    let cwd = std::env::current_dir().context("cannot read the working directory")?;
    let mut config = CabinetConfig::load(&cwd)?;
    if let Some(dir) = data_dir {
        config.data_dir = Some(dir);
    }
    tracing::debug!(backend = %config.backend, "configuration loaded");

    let context = initialize_with(config)?;
    Ok(AppContext {
        api: context.api,
        config: context.config,
        out: Output::detect(),
    })
}

fn status_filter(status: StatusArgs) -> RecordStatusFilter {
    if status.all {
        RecordStatusFilter::All
    } else if status.deleted {
        RecordStatusFilter::Deleted
    } else {
        RecordStatusFilter::Active
    }
}

// --- Content ---

fn handle_content(ctx: &mut AppContext, cmd: ContentCommands) -> Result<()> {
    match cmd {
        ContentCommands::List { status } => {
            let result = ctx.api.list_documents(status_filter(status))?;
            print!("{}", ctx.out.documents(&result.records));
        }
        ContentCommands::Show { page, section } => {
            let doc = ctx.api.fetch_document(&page, &section)?;
            println!("{}", serde_json::to_string_pretty(&doc.content)?);
        }
        ContentCommands::Form { page, section } => {
            let form = ctx.api.document_form(&page, &section)?;
            print!("{}", ctx.out.form(&form));
        }
        ContentCommands::Edit { page, section, set } => {
            let edits = set
                .iter()
                .map(|s| TextEdit::parse(s))
                .collect::<cabinetapp::error::Result<Vec<_>>>()?;
            let result = ctx.api.edit_document(&page, &section, &edits)?;
            ctx.print_messages(&result);
        }
        ContentCommands::Put {
            page,
            section,
            file,
            json,
        } => {
            let document = read_document(file, json)?;
            let result = ctx.api.put_document(&page, &section, document)?;
            ctx.print_messages(&result);
        }
        ContentCommands::Delete { id } => {
            let result = ctx.api.delete_document(&id)?;
            ctx.print_messages(&result);
        }
        ContentCommands::Restore { id } => {
            let result = ctx.api.restore_document(&id)?;
            ctx.print_messages(&result);
        }
    }
    Ok(())
}

fn read_document(file: Option<PathBuf>, json: Option<String>) -> Result<Value> {
    let (source, text) = match (file, json) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            (path.display().to_string(), text)
        }
        (None, Some(text)) => ("--json".to_string(), text),
        (None, None) => bail!("give the document with --file or --json"),
    };
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", source))
}

// --- Properties ---

fn handle_properties(ctx: &mut AppContext, cmd: PropertyCommands) -> Result<()> {
    match cmd {
        PropertyCommands::List {
            listing_type,
            kind,
            min_price,
            max_price,
            location,
            status,
        } => {
            let filter = PropertyFilter {
                listing_type,
                property_type: kind,
                min_price,
                max_price,
                location,
                status: status_filter(status),
            };
            let result = ctx.api.list_properties(&filter)?;
            print!("{}", ctx.out.properties(&result.records));
        }
        PropertyCommands::Add { fields } => {
            let (input, images, videos) = new_property(fields)?;
            let result = ctx.api.create_property(input, &images, &videos)?;
            ctx.print_messages(&result);
        }
        PropertyCommands::Show { id } => {
            let property = ctx.api.get_property(&id)?;
            print!("{}", ctx.out.property(&property));
        }
        PropertyCommands::Update {
            id,
            fields,
            clear_rooms,
        } => {
            let images = fields.images.clone();
            let videos = fields.videos.clone();
            let patch = PropertyPatch {
                title: fields.title,
                description: fields.description,
                listing_type: fields.listing_type,
                property_type: fields.kind,
                price: fields.price,
                location: fields.location,
                surface: fields.surface,
                rooms: if clear_rooms { Some(None) } else { fields.rooms.map(Some) },
                architecture_style: fields.style,
            };
            let result = ctx.api.update_property(&id, patch, &images, &videos)?;
            ctx.print_messages(&result);
        }
        PropertyCommands::Delete { id } => {
            let result = ctx.api.delete_property(&id)?;
            ctx.print_messages(&result);
        }
        PropertyCommands::Restore { id } => {
            let result = ctx.api.restore_property(&id)?;
            ctx.print_messages(&result);
        }
        PropertyCommands::Types(cmd) => handle_property_types(ctx, cmd)?,
    }
    Ok(())
}

fn handle_property_types(ctx: &mut AppContext, cmd: PropertyTypeCommands) -> Result<()> {
    match cmd {
        PropertyTypeCommands::List { status } => {
            let result = ctx.api.list_property_types(status_filter(status))?;
            print!("{}", ctx.out.property_types(&result.records));
        }
        PropertyTypeCommands::Add { name } => {
            let result = ctx.api.add_property_type(&name)?;
            ctx.print_messages(&result);
        }
        PropertyTypeCommands::Delete { id } => {
            let result = ctx.api.delete_property_type(&id)?;
            ctx.print_messages(&result);
        }
        PropertyTypeCommands::Restore { id } => {
            let result = ctx.api.restore_property_type(&id)?;
            ctx.print_messages(&result);
        }
    }
    Ok(())
}

type NewPropertyArgs = (NewProperty, Vec<PathBuf>, Vec<PathBuf>);

/// Enum and number fields cannot default sensibly, so they are required here;
/// text fields are checked by the library with the rest of the form.
fn new_property(fields: PropertyFields) -> Result<NewPropertyArgs> {
    let missing: Vec<&str> = [
        ("--type", fields.listing_type.is_none()),
        ("--kind", fields.kind.is_none()),
        ("--price", fields.price.is_none()),
        ("--surface", fields.surface.is_none()),
    ]
    .into_iter()
    .filter_map(|(flag, absent)| absent.then_some(flag))
    .collect();

    let (Some(listing_type), Some(property_type), Some(price), Some(surface)) =
        (fields.listing_type, fields.kind, fields.price, fields.surface)
    else {
        bail!("missing required option(s): {}", missing.join(", "));
    };

    let input = NewProperty {
        title: fields.title.unwrap_or_default(),
        description: fields.description.unwrap_or_default(),
        listing_type,
        property_type,
        price,
        location: fields.location.unwrap_or_default(),
        surface,
        rooms: fields.rooms,
        architecture_style: fields.style,
    };
    Ok((input, fields.images, fields.videos))
}

// --- Appointments ---

fn handle_appointments(ctx: &mut AppContext, cmd: AppointmentCommands) -> Result<()> {
    match cmd {
        AppointmentCommands::List => {
            let entries = ctx.api.list_appointments()?;
            print!("{}", ctx.out.appointments(&entries));
        }
        AppointmentCommands::Show { id } => {
            let appointment = ctx.api.get_appointment(&id)?;
            print!("{}", ctx.out.appointment(&appointment));
        }
        AppointmentCommands::Book {
            first_name,
            last_name,
            email,
            phone,
            client_type,
            consultation_type,
            platform,
            object,
            summary,
            date,
            time,
            receipt,
        } => {
            let request = AppointmentRequest {
                first_name,
                last_name,
                email,
                phone,
                client_type,
                consultation_type,
                online_platform: platform,
                consultation_object: object,
                consultation_summary: summary,
                desired_date: date,
                appointment_time: time,
            };
            let result = ctx.api.book_appointment(request, receipt.as_deref())?;
            ctx.print_messages(&result);
        }
        AppointmentCommands::Visit {
            property,
            name,
            email,
            phone,
            date,
            message,
        } => {
            let result =
                ctx.api
                    .request_visit(&property, date, &name, &email, &phone, message.as_deref())?;
            ctx.print_messages(&result);
        }
        AppointmentCommands::Approve { id } => {
            let result = ctx.api.approve_appointment(&id)?;
            ctx.print_messages(&result);
        }
        AppointmentCommands::Reject { id } => {
            let result = ctx.api.reject_appointment(&id)?;
            ctx.print_messages(&result);
        }
    }
    Ok(())
}

// --- Site records ---

fn joined_items(items: Vec<String>) -> Option<String> {
    (!items.is_empty()).then(|| items.join("\n"))
}

fn handle_services(ctx: &mut AppContext, cmd: ServiceCommands) -> Result<()> {
    let result = match cmd {
        ServiceCommands::List { status } => {
            let result = ctx.api.list_services(status_filter(status))?;
            print!("{}", ctx.out.services(&result.records));
            return Ok(());
        }
        ServiceCommands::Add { title, icon, items } => ctx.api.add_service(ServiceInput {
            title,
            icon_name: icon,
            description: items.join("\n"),
        })?,
        ServiceCommands::Update {
            id,
            title,
            icon,
            items,
        } => ctx.api.update_service(
            &id,
            ServicePatch {
                title,
                icon_name: icon,
                description: joined_items(items),
            },
        )?,
        ServiceCommands::Delete { id } => ctx.api.delete_service(&id)?,
        ServiceCommands::Restore { id } => ctx.api.restore_service(&id)?,
    };
    ctx.print_messages(&result);
    Ok(())
}

fn handle_social(ctx: &mut AppContext, cmd: SocialCommands) -> Result<()> {
    let result = match cmd {
        SocialCommands::List { status } => {
            let result = ctx.api.list_social_links(status_filter(status))?;
            print!("{}", ctx.out.social_links(&result.records));
            return Ok(());
        }
        SocialCommands::Add { name, url, icon } => ctx.api.add_social_link(SocialLinkInput {
            name,
            url,
            icon_name: icon,
        })?,
        SocialCommands::Update { id, name, url, icon } => ctx.api.update_social_link(
            &id,
            SocialLinkPatch {
                name,
                url,
                icon_name: icon,
            },
        )?,
        SocialCommands::Up { id } => ctx.api.move_social_link_up(&id)?,
        SocialCommands::Down { id } => ctx.api.move_social_link_down(&id)?,
        SocialCommands::Delete { id } => ctx.api.delete_social_link(&id)?,
        SocialCommands::Restore { id } => ctx.api.restore_social_link(&id)?,
    };
    ctx.print_messages(&result);
    Ok(())
}

fn handle_menus(ctx: &mut AppContext, cmd: MenuCommands) -> Result<()> {
    let result = match cmd {
        MenuCommands::List { status } => {
            let result = ctx.api.list_menus(status_filter(status))?;
            print!("{}", ctx.out.menus(&result.records));
            return Ok(());
        }
        MenuCommands::Add {
            title,
            slug,
            content,
            order,
        } => ctx.api.add_menu(MenuInput {
            title,
            slug,
            content,
            order_index: order,
        })?,
        MenuCommands::Update {
            id,
            title,
            slug,
            content,
            order,
        } => ctx.api.update_menu(
            &id,
            MenuPatch {
                title,
                slug,
                content,
                order_index: order,
            },
        )?,
        MenuCommands::Delete { id } => ctx.api.delete_menu(&id)?,
        MenuCommands::Restore { id } => ctx.api.restore_menu(&id)?,
    };
    ctx.print_messages(&result);
    Ok(())
}

// --- Statistics ---

fn handle_stats(ctx: &mut AppContext, cmd: StatsCommands) -> Result<()> {
    match cmd {
        StatsCommands::Visits { timeframe } => {
            let counts = ctx.api.visit_counts(timeframe)?;
            print!("{}", ctx.out.visits(&counts, timeframe));
        }
        StatsCommands::Searches => {
            let breakdown = ctx.api.search_breakdown()?;
            print!("{}", ctx.out.searches(&breakdown));
        }
        StatsCommands::RecordVisit { page } => {
            let result = ctx.api.record_visit(page.as_deref())?;
            ctx.print_messages(&result);
        }
        StatsCommands::RecordSearch {
            search_type,
            location,
            architecture,
            min_price,
            max_price,
            property,
        } => {
            let property_id = property
                .map(|p| ctx.api.resolve_id(Collection::Properties, &p))
                .transpose()?;
            let result = ctx.api.record_search(SearchInput {
                property_id,
                search_type,
                architecture_preference: architecture,
                location_preference: location,
                price_range_min: min_price,
                price_range_max: max_price,
            })?;
            ctx.print_messages(&result);
        }
    }
    Ok(())
}

// --- Misc ---

fn handle_config(ctx: &AppContext, key: Option<String>) -> Result<()> {
    let entries = ctx.config.entries();
    match key {
        Some(key) => {
            let key = key.replace('-', "_");
            let Some((_, value)) = entries.iter().find(|(k, _)| *k == key) else {
                let known: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
                bail!("unknown key '{}' (known: {})", key, known.join(", "));
            };
            println!("{}", value);
        }
        None => print!("{}", ctx.out.config(&entries)),
    }
    Ok(())
}

fn handle_files(ctx: &mut AppContext, cmd: FileCommands) -> Result<()> {
    match cmd {
        FileCommands::Rm { bucket, path } => {
            let result = ctx.api.remove_file(&bucket, &path)?;
            ctx.print_messages(&result);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabinetapp::model::ListingType;

    #[test]
    fn status_flags_map_to_filters() {
        assert_eq!(status_filter(StatusArgs::default()), RecordStatusFilter::Active);
        let deleted = StatusArgs { deleted: true, all: false };
        assert_eq!(status_filter(deleted), RecordStatusFilter::Deleted);
        let all = StatusArgs { deleted: false, all: true };
        assert_eq!(status_filter(all), RecordStatusFilter::All);
    }

    #[test]
    fn new_property_names_every_missing_option() {
        let err = new_property(PropertyFields {
            title: Some("Villa".into()),
            listing_type: Some(ListingType::Vente),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required option(s): --kind, --price, --surface"
        );
    }

    #[test]
    fn new_property_keeps_files() {
        let (input, images, videos) = new_property(PropertyFields {
            title: Some("Villa".into()),
            listing_type: Some(ListingType::Location),
            kind: Some("appartement".into()),
            price: Some(250_000.0),
            surface: Some(80.0),
            images: vec![PathBuf::from("a.jpg")],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(input.title, "Villa");
        assert_eq!(input.description, "");
        assert_eq!(images, [PathBuf::from("a.jpg")]);
        assert!(videos.is_empty());
    }

    #[test]
    fn documents_come_from_inline_json() {
        let doc = read_document(None, Some(r#"{"title":"Bienvenue"}"#.into())).unwrap();
        assert_eq!(doc["title"], "Bienvenue");
        let err = read_document(None, Some("{oops".into())).unwrap_err();
        assert!(err.to_string().contains("--json is not valid JSON"));
    }

    #[test]
    fn blank_item_list_leaves_description_alone() {
        assert_eq!(joined_items(vec![]), None);
        assert_eq!(joined_items(vec!["a".into(), "b".into()]), Some("a\nb".to_string()));
    }
}
