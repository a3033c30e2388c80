use cabinetapp::commands::stats::Timeframe;
use cabinetapp::model::{ClientType, ConsultationType, ListingType, OnlinePlatform};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.0" for releases, "0.3.0@abc1234 2026-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "cabinet",
    bin_name = "cabinet",
    version = get_version(),
    disable_help_flag = true,
    disable_help_subcommand = true
)]
#[command(about = "Back office for the cabinet website", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Use this directory for the fs backend
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print help
    #[arg(short, long, global = true)]
    pub help: bool,
}

/// Command group definitions for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Content,
    Listings,
    Site,
    Reports,
    Misc,
}

impl CommandGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            CommandGroup::Content => "Content:",
            CommandGroup::Listings => "Listings & Bookings:",
            CommandGroup::Site => "Site Records:",
            CommandGroup::Reports => "Reports:",
            CommandGroup::Misc => "Miscellaneous:",
        }
    }

    pub fn for_command(name: &str) -> Option<Self> {
        match name {
            "content" => Some(CommandGroup::Content),
            "properties" | "appointments" => Some(CommandGroup::Listings),
            "services" | "social" | "menus" => Some(CommandGroup::Site),
            "stats" => Some(CommandGroup::Reports),
            "config" | "files" | "help" => Some(CommandGroup::Misc),
            _ => None,
        }
    }

    pub fn all() -> &'static [CommandGroup] {
        &[
            CommandGroup::Content,
            CommandGroup::Listings,
            CommandGroup::Site,
            CommandGroup::Reports,
            CommandGroup::Misc,
        ]
    }
}

/// Returns the custom grouped help output as a string
pub fn get_grouped_help() -> String {
    let cmd = Cli::command();
    let version = cmd.get_version().unwrap_or("unknown");

    let mut output = String::new();
    output.push_str(&format!("cabinet {version}\n"));
    output.push_str("Back office for the cabinet website\n");
    output.push('\n');
    output.push_str("Usage: cabinet [OPTIONS] [COMMAND]\n");

    let subcommands: Vec<_> = cmd.get_subcommands().collect();

    for group in CommandGroup::all() {
        let group_cmds: Vec<_> = subcommands
            .iter()
            .filter(|sc| !sc.is_hide_set() && CommandGroup::for_command(sc.get_name()) == Some(*group))
            .collect();

        if !group_cmds.is_empty() {
            output.push('\n');
            output.push_str(&format!("{}\n", group.heading()));
            for sc in group_cmds {
                let name = sc.get_name();
                let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
                output.push_str(&format!("  {:<14} {}\n", name, about));
            }
        }
    }

    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("      --data-dir <DIR>  Use this directory for the fs backend\n");
    output.push_str("  -v, --verbose         Verbose output\n");
    output.push_str("  -h, --help            Print help\n");
    output.push_str("  -V, --version         Print version\n");

    output
}

pub fn print_grouped_help() {
    print!("{}", get_grouped_help());
}

/// Prints clap's help for a command path such as `["properties", "add"]`.
/// Falls back to the grouped help when the path does not name a command.
pub fn print_help_for_path(path: &[&str]) {
    let mut current = Cli::command();
    for name in path {
        match current.find_subcommand(name).cloned() {
            Some(sub) => current = sub,
            None => {
                eprintln!("Unknown command: {}", path.join(" "));
                eprintln!();
                print_grouped_help();
                return;
            }
        }
    }
    if path.is_empty() {
        print_grouped_help();
    } else {
        print!("{}", current.render_help());
    }
}

/// The command path of a parsed invocation, used for `-h` on subcommands.
pub fn command_path(command: &Option<Commands>) -> Vec<&'static str> {
    let Some(command) = command else {
        return Vec::new();
    };
    match command {
        Commands::Content(c) => vec!["content", c.name()],
        Commands::Properties(c) => vec!["properties", c.name()],
        Commands::Appointments(c) => vec!["appointments", c.name()],
        Commands::Services(c) => vec!["services", c.name()],
        Commands::Social(c) => vec!["social", c.name()],
        Commands::Menus(c) => vec!["menus", c.name()],
        Commands::Stats(c) => vec!["stats", c.name()],
        Commands::Config { .. } => vec!["config"],
        Commands::Files(c) => vec!["files", c.name()],
        Commands::Help { .. } => vec!["help"],
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Edit page content sections
    #[command(subcommand, display_order = 1)]
    Content(ContentCommands),

    /// Manage real-estate listings
    #[command(subcommand, alias = "props", display_order = 10)]
    Properties(PropertyCommands),

    /// Consultation bookings and visit requests
    #[command(subcommand, alias = "appts", display_order = 11)]
    Appointments(AppointmentCommands),

    /// Manage the services offered
    #[command(subcommand, display_order = 20)]
    Services(ServiceCommands),

    /// Manage social network links
    #[command(subcommand, display_order = 21)]
    Social(SocialCommands),

    /// Manage navigation menu entries
    #[command(subcommand, display_order = 22)]
    Menus(MenuCommands),

    /// Visit and search statistics
    #[command(subcommand, display_order = 30)]
    Stats(StatsCommands),

    /// Show the resolved configuration
    #[command(display_order = 40)]
    Config {
        /// Print only this key
        key: Option<String>,
    },

    /// Manage stored files
    #[command(subcommand, display_order = 41)]
    Files(FileCommands),

    /// Print help for cabinet or a subcommand
    #[command(display_order = 42)]
    Help {
        /// Command path, e.g. `properties add`
        #[arg(num_args = 0..)]
        command: Vec<String>,
    },
}

/// Which records a listing shows.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct StatusArgs {
    /// Show deleted records only
    #[arg(long, conflicts_with = "all")]
    pub deleted: bool,

    /// Show active and deleted records
    #[arg(long)]
    pub all: bool,
}

#[derive(Subcommand, Debug)]
pub enum ContentCommands {
    /// List content sections
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        status: StatusArgs,
    },

    /// Print a section's JSON document
    Show { page: String, section: String },

    /// Print a section's editable fields and their paths
    Form { page: String, section: String },

    /// Set one or more fields and save the section once
    Edit {
        page: String,
        section: String,

        /// PATH=VALUE, e.g. hero.title=Bienvenue or items.0.visible=false
        #[arg(long = "set", value_name = "PATH=VALUE", required = true, num_args = 1)]
        set: Vec<String>,
    },

    /// Create or replace a section's whole document
    Put {
        page: String,
        section: String,

        /// Read the document from a JSON file
        #[arg(long, conflicts_with = "json", required_unless_present = "json")]
        file: Option<PathBuf>,

        /// The document as inline JSON
        #[arg(long)]
        json: Option<String>,
    },

    /// Soft-delete a section
    #[command(alias = "rm")]
    Delete { id: String },

    /// Restore a deleted section
    Restore { id: String },
}

impl ContentCommands {
    fn name(&self) -> &'static str {
        match self {
            ContentCommands::List { .. } => "list",
            ContentCommands::Show { .. } => "show",
            ContentCommands::Form { .. } => "form",
            ContentCommands::Edit { .. } => "edit",
            ContentCommands::Put { .. } => "put",
            ContentCommands::Delete { .. } => "delete",
            ContentCommands::Restore { .. } => "restore",
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct PropertyFields {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// vente or location
    #[arg(long = "type", value_name = "TYPE")]
    pub listing_type: Option<ListingType>,

    /// A name from `cabinet properties types list`
    #[arg(long)]
    pub kind: Option<String>,

    #[arg(long)]
    pub price: Option<f64>,

    #[arg(long)]
    pub location: Option<String>,

    /// Surface in square meters
    #[arg(long)]
    pub surface: Option<f64>,

    #[arg(long)]
    pub rooms: Option<u32>,

    /// Architecture style
    #[arg(long)]
    pub style: Option<String>,

    /// Image file to upload (repeatable)
    #[arg(long = "image", value_name = "PATH")]
    pub images: Vec<PathBuf>,

    /// Video file to upload (repeatable)
    #[arg(long = "video", value_name = "PATH")]
    pub videos: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum PropertyCommands {
    /// List properties
    #[command(alias = "ls")]
    List {
        /// vente or location
        #[arg(long = "type", value_name = "TYPE")]
        listing_type: Option<ListingType>,

        /// Property type name, case-insensitive
        #[arg(long)]
        kind: Option<String>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,

        /// Part of the location, case-insensitive
        #[arg(long)]
        location: Option<String>,

        #[command(flatten)]
        status: StatusArgs,
    },

    /// Add a property
    Add {
        #[command(flatten)]
        fields: PropertyFields,
    },

    /// Show one property
    Show { id: String },

    /// Change fields of a property; uploaded files are appended
    Update {
        id: String,

        #[command(flatten)]
        fields: PropertyFields,

        /// Remove the room count
        #[arg(long, conflicts_with = "rooms")]
        clear_rooms: bool,
    },

    /// Soft-delete a property
    #[command(alias = "rm")]
    Delete { id: String },

    /// Restore a deleted property
    Restore { id: String },

    /// Manage the property type catalog
    #[command(subcommand)]
    Types(PropertyTypeCommands),
}

#[derive(Subcommand, Debug)]
pub enum PropertyTypeCommands {
    /// List property types
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        status: StatusArgs,
    },

    /// Add a property type
    Add { name: String },

    /// Soft-delete a property type; listings using it keep their type
    #[command(alias = "rm")]
    Delete { id: String },

    /// Restore a deleted property type
    Restore { id: String },
}

impl PropertyCommands {
    fn name(&self) -> &'static str {
        match self {
            PropertyCommands::List { .. } => "list",
            PropertyCommands::Add { .. } => "add",
            PropertyCommands::Show { .. } => "show",
            PropertyCommands::Update { .. } => "update",
            PropertyCommands::Delete { .. } => "delete",
            PropertyCommands::Restore { .. } => "restore",
            PropertyCommands::Types(_) => "types",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AppointmentCommands {
    /// List appointments, newest first
    #[command(alias = "ls")]
    List,

    /// Show one appointment
    Show { id: String },

    /// Book a consultation
    Book {
        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// particulier or professionnel
        #[arg(long, default_value = "particulier")]
        client_type: ClientType,

        /// presentiel or en_ligne
        #[arg(long, default_value = "presentiel")]
        consultation_type: ConsultationType,

        /// whatsapp, zoom or google_meet
        #[arg(long)]
        platform: Option<OnlinePlatform>,

        /// Object of the consultation
        #[arg(long, default_value = "")]
        object: String,

        /// Short summary of the situation
        #[arg(long, default_value = "")]
        summary: String,

        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,

        /// One of the hourly slots from 9:00 to 17:00
        #[arg(long, default_value = "")]
        time: String,

        /// Payment receipt (image or PDF)
        #[arg(long, value_name = "PATH")]
        receipt: Option<PathBuf>,
    },

    /// Request a visit of a property
    Visit {
        /// Property id
        property: String,

        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        message: Option<String>,
    },

    /// Approve an appointment
    Approve { id: String },

    /// Reject an appointment
    Reject { id: String },
}

impl AppointmentCommands {
    fn name(&self) -> &'static str {
        match self {
            AppointmentCommands::List => "list",
            AppointmentCommands::Show { .. } => "show",
            AppointmentCommands::Book { .. } => "book",
            AppointmentCommands::Visit { .. } => "visit",
            AppointmentCommands::Approve { .. } => "approve",
            AppointmentCommands::Reject { .. } => "reject",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommands {
    /// List services
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        status: StatusArgs,
    },

    /// Add a service
    Add {
        #[arg(long, default_value = "")]
        title: String,

        /// Icon name
        #[arg(long, default_value = "")]
        icon: String,

        /// One bullet line (repeatable)
        #[arg(long = "item", value_name = "TEXT")]
        items: Vec<String>,
    },

    /// Change a service; given items replace all bullet lines
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        icon: Option<String>,

        #[arg(long = "item", value_name = "TEXT")]
        items: Vec<String>,
    },

    /// Soft-delete a service
    #[command(alias = "rm")]
    Delete { id: String },

    /// Restore a deleted service
    Restore { id: String },
}

impl ServiceCommands {
    fn name(&self) -> &'static str {
        match self {
            ServiceCommands::List { .. } => "list",
            ServiceCommands::Add { .. } => "add",
            ServiceCommands::Update { .. } => "update",
            ServiceCommands::Delete { .. } => "delete",
            ServiceCommands::Restore { .. } => "restore",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SocialCommands {
    /// List social links in display order
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        status: StatusArgs,
    },

    /// Add a link at the end of the list
    Add {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        url: String,

        #[arg(long, default_value = "")]
        icon: String,
    },

    /// Change a link
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },

    /// Move a link one place up
    Up { id: String },

    /// Move a link one place down
    Down { id: String },

    /// Soft-delete a link
    #[command(alias = "rm")]
    Delete { id: String },

    /// Restore a deleted link
    Restore { id: String },
}

impl SocialCommands {
    fn name(&self) -> &'static str {
        match self {
            SocialCommands::List { .. } => "list",
            SocialCommands::Add { .. } => "add",
            SocialCommands::Update { .. } => "update",
            SocialCommands::Up { .. } => "up",
            SocialCommands::Down { .. } => "down",
            SocialCommands::Delete { .. } => "delete",
            SocialCommands::Restore { .. } => "restore",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum MenuCommands {
    /// List menu entries in display order
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        status: StatusArgs,
    },

    /// Add a menu entry
    Add {
        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "")]
        slug: String,

        #[arg(long)]
        content: Option<String>,

        /// Position in the menu
        #[arg(long, default_value_t = 0)]
        order: i64,
    },

    /// Change a menu entry; an empty --content clears it
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        slug: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        order: Option<i64>,
    },

    /// Soft-delete a menu entry
    #[command(alias = "rm")]
    Delete { id: String },

    /// Restore a deleted menu entry
    Restore { id: String },
}

impl MenuCommands {
    fn name(&self) -> &'static str {
        match self {
            MenuCommands::List { .. } => "list",
            MenuCommands::Add { .. } => "add",
            MenuCommands::Update { .. } => "update",
            MenuCommands::Delete { .. } => "delete",
            MenuCommands::Restore { .. } => "restore",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum StatsCommands {
    /// Visits per period
    Visits {
        /// day, week, month or year
        #[arg(long = "by", default_value = "day")]
        timeframe: Timeframe,
    },

    /// Property searches by location and type
    Searches,

    /// Record one site visit
    RecordVisit {
        #[arg(long)]
        page: Option<String>,
    },

    /// Record one property search
    RecordSearch {
        /// Kind of search, e.g. vente or location
        #[arg(long = "type", value_name = "TYPE", default_value = "")]
        search_type: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        architecture: Option<String>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,

        /// Property the search led to
        #[arg(long)]
        property: Option<String>,
    },
}

impl StatsCommands {
    fn name(&self) -> &'static str {
        match self {
            StatsCommands::Visits { .. } => "visits",
            StatsCommands::Searches => "searches",
            StatsCommands::RecordVisit { .. } => "record-visit",
            StatsCommands::RecordSearch { .. } => "record-search",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    /// Delete a stored file, e.g. an orphaned receipt
    #[command(alias = "remove")]
    Rm { bucket: String, path: String },
}

impl FileCommands {
    fn name(&self) -> &'static str {
        match self {
            FileCommands::Rm { .. } => "rm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cabinet").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn grouped_help_lists_every_command() {
        let help = get_grouped_help();
        for name in ["content", "properties", "appointments", "services", "social", "menus", "stats", "config", "files"] {
            assert!(help.contains(name), "missing {name}");
        }
        assert!(help.find("Content:").unwrap() < help.find("Reports:").unwrap());
    }

    #[test]
    fn edit_collects_repeated_sets() {
        let cli = parse(&["content", "edit", "home", "hero", "--set", "title=A", "--set", "items.0=B"]);
        match cli.command {
            Some(Commands::Content(ContentCommands::Edit { set, .. })) => {
                assert_eq!(set, ["title=A", "items.0=B"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn put_needs_a_source() {
        let args = ["cabinet", "content", "put", "home", "hero"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn property_enums_parse_from_text() {
        let cli = parse(&["properties", "list", "--type", "location", "--kind", "appartement"]);
        match cli.command {
            Some(Commands::Properties(PropertyCommands::List { listing_type, kind, .. })) => {
                assert_eq!(listing_type, Some(ListingType::Location));
                assert_eq!(kind.as_deref(), Some("appartement"));
            }
            other => panic!("unexpected {other:?}"),
        }
        let bad = ["cabinet", "properties", "list", "--type", "rent"];
        assert!(Cli::try_parse_from(bad).is_err());
    }

    #[test]
    fn clear_rooms_conflicts_with_rooms() {
        let cli = parse(&["properties", "update", "ab12cd", "--clear-rooms"]);
        match cli.command {
            Some(Commands::Properties(PropertyCommands::Update { clear_rooms, fields, .. })) => {
                assert!(clear_rooms);
                assert_eq!(fields.rooms, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        let both = ["cabinet", "properties", "update", "ab12cd", "--rooms", "3", "--clear-rooms"];
        assert!(Cli::try_parse_from(both).is_err());
    }

    #[test]
    fn property_types_nest_under_properties() {
        let cli = parse(&["properties", "types", "add", "Villa"]);
        match cli.command {
            Some(Commands::Properties(PropertyCommands::Types(PropertyTypeCommands::Add { name }))) => {
                assert_eq!(name, "Villa");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn visits_default_to_days() {
        let cli = parse(&["stats", "visits"]);
        match cli.command {
            Some(Commands::Stats(StatsCommands::Visits { timeframe })) => assert_eq!(timeframe, Timeframe::Day),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn command_path_names_subcommand() {
        let cli = parse(&["social", "up", "abcd"]);
        assert_eq!(command_path(&cli.command), ["social", "up"]);
        assert!(command_path(&None).is_empty());
    }

    #[test]
    fn deleted_and_all_conflict() {
        let args = ["cabinet", "services", "list", "--deleted", "--all"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
