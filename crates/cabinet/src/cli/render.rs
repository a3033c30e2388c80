//! # Rendering
//!
//! Styled terminal output: data is flattened into small serializable line
//! structs, then rendered through the templates in `templates/` with a
//! minijinja environment whose `style` filter maps semantic names to
//! terminal styles.
//!
//! Layout calculations (width, truncation, padding) stay in Rust because they
//! need Unicode-aware processing. Templates handle presentation: which style
//! applies and how lines are grouped.
//!
//! Color is decided once per [`Output`]: on when stdout is a terminal that
//! supports it, off otherwise. Tests render with [`Output::plain`].

use super::styles::{names, CABINET_STYLES};
use super::templates::{
    APPOINTMENTS_TEMPLATE, DETAIL_TEMPLATE, FORM_TEMPLATE, MESSAGES_TEMPLATE, RECORD_LIST_TEMPLATE,
    SEARCHES_TEMPLATE, VISITS_TEMPLATE,
};
use cabinetapp::commands::appointments::AppointmentEntry;
use cabinetapp::commands::stats::{SearchBreakdown, Tally, Timeframe, VisitCount};
use cabinetapp::commands::{CmdMessage, MessageLevel};
use cabinetapp::content::{self, Control, FormNode};
use cabinetapp::model::{Appointment, MenuItem, PageContent, Property, PropertyType, Service, SocialLink};
use chrono::{DateTime, Utc};
use console::Term;
use minijinja::{Environment, Value};
use serde::Serialize;
use serde_json::Value as Json;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use uuid::Uuid;

pub const ID_WIDTH: usize = 8;
pub const TITLE_WIDTH: usize = 34;
pub const DETAIL_WIDTH: usize = 40;
pub const TIME_WIDTH: usize = 14;
pub const NAME_WIDTH: usize = 24;
pub const FIELD_VALUE_WIDTH: usize = 60;
pub const BAR_WIDTH: usize = 40;

#[derive(Serialize)]
struct MessageData {
    content: String,
    style: &'static str,
}

#[derive(Serialize)]
struct MessagesData {
    messages: Vec<MessageData>,
}

/// One row of a record listing, already laid out.
#[derive(Serialize)]
struct RecordLine {
    id: String,
    title: String,
    padding: String,
    detail: String,
    detail_padding: String,
    time_ago: String,
    is_deleted: bool,
}

#[derive(Serialize)]
struct RecordListData {
    lines: Vec<RecordLine>,
    empty_message: String,
}

#[derive(Serialize)]
struct DetailField {
    label: String,
    value: String,
}

#[derive(Serialize)]
struct DetailData {
    title: String,
    subtitle: Option<String>,
    fields: Vec<DetailField>,
}

#[derive(Serialize)]
struct FormLine {
    indent: String,
    label: String,
    path: String,
    control: String,
    value: String,
    is_field: bool,
}

#[derive(Serialize)]
struct FormData {
    lines: Vec<FormLine>,
}

#[derive(Serialize)]
struct AppointmentLine {
    id: String,
    date: String,
    time: String,
    name: String,
    padding: String,
    status: &'static str,
    subject: String,
}

#[derive(Serialize)]
struct AppointmentsData {
    lines: Vec<AppointmentLine>,
}

#[derive(Serialize)]
struct VisitLine {
    period: String,
    count: String,
    bar: String,
}

#[derive(Serialize)]
struct VisitsData {
    heading: String,
    lines: Vec<VisitLine>,
}

#[derive(Serialize)]
struct TallyLine {
    name: String,
    count: String,
}

#[derive(Serialize)]
struct SearchSection {
    heading: &'static str,
    rows: Vec<TallyLine>,
}

#[derive(Serialize)]
struct SearchesData {
    sections: Vec<SearchSection>,
}

/// Renders command results for the terminal.
pub struct Output {
    use_color: bool,
}

impl Output {
    pub fn detect() -> Self {
        Self {
            use_color: Term::stdout().features().colors_supported(),
        }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self { use_color: false }
    }

    fn render<T: Serialize>(&self, template: &str, data: &T) -> String {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        let styles = &*CABINET_STYLES;
        let use_color = self.use_color;
        env.add_filter("style", move |value: Value, name: String| -> String {
            let text = value.to_string();
            if use_color {
                styles.apply(&name, &text)
            } else {
                styles.apply_plain(&name, &text)
            }
        });
        env.render_str(template, data)
            .unwrap_or_else(|e| format!("Render error: {}\n", e))
    }

    pub fn messages(&self, messages: &[CmdMessage]) -> String {
        if messages.is_empty() {
            return String::new();
        }
        let data = MessagesData {
            messages: messages
                .iter()
                .map(|m| MessageData {
                    content: m.content.clone(),
                    style: match m.level {
                        MessageLevel::Info => names::INFO,
                        MessageLevel::Success => names::SUCCESS,
                        MessageLevel::Warning => names::WARNING,
                        MessageLevel::Error => names::ERROR,
                    },
                })
                .collect(),
        };
        self.render(MESSAGES_TEMPLATE, &data)
    }

    fn record_list(&self, lines: Vec<RecordLine>, empty_message: &str) -> String {
        let data = RecordListData {
            lines,
            empty_message: empty_message.to_string(),
        };
        self.render(RECORD_LIST_TEMPLATE, &data)
    }

    pub fn documents(&self, docs: &[PageContent]) -> String {
        let lines = docs
            .iter()
            .map(|doc| {
                let fields = content::render(&doc.content).fields().len();
                record_line(
                    &doc.id,
                    &format!("{}/{}", doc.page_name, doc.section_name),
                    &format!("{} field(s)", fields),
                    doc.created_at,
                    doc.deleted_at.is_some(),
                )
            })
            .collect();
        self.record_list(lines, "No content sections.")
    }

    pub fn properties(&self, properties: &[Property]) -> String {
        let lines = properties
            .iter()
            .map(|p| {
                let detail = format!(
                    "{} · {} · {} FCFA · {}",
                    p.listing_type,
                    p.property_type,
                    format_price(p.price),
                    p.location
                );
                record_line(&p.id, &p.title, &detail, p.created_at, p.deleted_at.is_some())
            })
            .collect();
        self.record_list(lines, "No properties found.")
    }

    pub fn property(&self, p: &Property) -> String {
        let mut fields = vec![
            ("id", p.id.to_string()),
            ("type", p.listing_type.to_string()),
            ("kind", p.property_type.clone()),
            ("price", format!("{} FCFA", format_price(p.price))),
            ("location", p.location.clone()),
            ("surface", format!("{} m²", p.surface)),
        ];
        if let Some(rooms) = p.rooms {
            fields.push(("rooms", rooms.to_string()));
        }
        if let Some(style) = &p.architecture_style {
            fields.push(("style", style.clone()));
        }
        fields.push(("description", p.description.clone()));
        push_each(&mut fields, "images", &p.images);
        push_each(&mut fields, "videos", &p.videos);
        fields.push(("created", format_timestamp(p.created_at)));
        if let Some(deleted) = p.deleted_at {
            fields.push(("deleted", format_timestamp(deleted)));
        }
        self.detail(&p.title, None, fields)
    }

    pub fn property_types(&self, types: &[PropertyType]) -> String {
        let lines = types
            .iter()
            .map(|t| record_line(&t.id, &t.name, "", t.created_at, t.deleted_at.is_some()))
            .collect();
        self.record_list(lines, "No property types.")
    }

    pub fn services(&self, services: &[Service]) -> String {
        let lines = services
            .iter()
            .map(|s| {
                let detail = format!("{} · {}", s.icon_name, s.description.join(", "));
                record_line(&s.id, &s.title, &detail, s.created_at, s.deleted_at.is_some())
            })
            .collect();
        self.record_list(lines, "No services.")
    }

    pub fn social_links(&self, links: &[SocialLink]) -> String {
        let lines = links
            .iter()
            .map(|l| {
                let title = format!("{}. {}", l.order_index, l.name);
                record_line(&l.id, &title, &l.url, l.created_at, l.deleted_at.is_some())
            })
            .collect();
        self.record_list(lines, "No social links.")
    }

    pub fn menus(&self, menus: &[MenuItem]) -> String {
        let lines = menus
            .iter()
            .map(|m| {
                let title = format!("{}. {}", m.order_index, m.title);
                record_line(&m.id, &title, &format!("/{}", m.slug), m.created_at, m.deleted_at.is_some())
            })
            .collect();
        self.record_list(lines, "No menu entries.")
    }

    pub fn appointments(&self, entries: &[AppointmentEntry]) -> String {
        let lines = entries
            .iter()
            .map(|entry| {
                let a = &entry.appointment;
                let name = truncate_to_width(&a.display_name(), NAME_WIDTH);
                let subject = match &entry.property {
                    Some(p) => format!("visit: {} ({})", p.title, p.location),
                    None => a.consultation_object.clone().unwrap_or_default(),
                };
                AppointmentLine {
                    id: short_id(&a.id),
                    date: a.desired_date.format("%Y-%m-%d").to_string(),
                    time: format!("{:>5}", a.appointment_time.as_deref().unwrap_or("--:--")),
                    padding: pad_for(&name, NAME_WIDTH),
                    name,
                    status: a.status.as_str(),
                    subject: truncate_to_width(&subject, DETAIL_WIDTH),
                }
            })
            .collect();
        self.render(APPOINTMENTS_TEMPLATE, &AppointmentsData { lines })
    }

    pub fn appointment(&self, a: &Appointment) -> String {
        let mut fields = vec![("id", a.id.to_string()), ("status", a.status.to_string())];
        let when = match &a.appointment_time {
            Some(time) => format!("{} {}", a.desired_date.format("%Y-%m-%d"), time),
            None => a.desired_date.format("%Y-%m-%d").to_string(),
        };
        fields.push(("date", when));
        let optional = [
            ("email", a.email.clone()),
            ("phone", a.phone.clone()),
            ("client", a.client_type.map(|c| c.to_string())),
            ("consultation", a.consultation_type.map(|c| c.to_string())),
            ("platform", a.online_platform.map(|p| p.to_string())),
            ("object", a.consultation_object.clone()),
            ("summary", a.consultation_summary.clone()),
            ("property", a.property_id.map(|id| id.to_string())),
            ("message", a.message.clone()),
            ("receipt", a.payment_receipt_url.clone()),
        ];
        fields.extend(optional.into_iter().filter_map(|(label, value)| value.map(|v| (label, v))));
        fields.push(("created", format_timestamp(a.created_at)));
        self.detail(&a.display_name(), None, fields)
    }

    pub fn form(&self, form: &FormNode) -> String {
        let mut lines = Vec::new();
        collect_form_lines(form, 0, &mut lines);
        self.render(FORM_TEMPLATE, &FormData { lines })
    }

    pub fn visits(&self, counts: &[VisitCount], timeframe: Timeframe) -> String {
        let max = counts.iter().map(|c| c.visits).max().unwrap_or(0);
        let period_width = counts.iter().map(|c| c.period.width()).max().unwrap_or(0);
        let count_width = max.to_string().len();
        let lines = counts
            .iter()
            .map(|c| VisitLine {
                period: format!("{}{}", c.period, pad_for(&c.period, period_width)),
                count: format!("{:>width$}", c.visits, width = count_width),
                bar: "█".repeat(bar_length(c.visits, max)),
            })
            .collect();
        let data = VisitsData {
            heading: format!("Visits by {}", timeframe),
            lines,
        };
        self.render(VISITS_TEMPLATE, &data)
    }

    pub fn searches(&self, breakdown: &SearchBreakdown) -> String {
        let data = SearchesData {
            sections: vec![
                SearchSection {
                    heading: "By location",
                    rows: tally_lines(&breakdown.by_location),
                },
                SearchSection {
                    heading: "By type",
                    rows: tally_lines(&breakdown.by_type),
                },
            ],
        };
        self.render(SEARCHES_TEMPLATE, &data)
    }

    pub fn config(&self, entries: &[(&'static str, String)]) -> String {
        let fields = entries
            .iter()
            .map(|(key, value)| {
                let value = if value.is_empty() { "(unset)".to_string() } else { value.clone() };
                (*key, value)
            })
            .collect();
        self.detail("Configuration", None, fields)
    }

    fn detail(&self, title: &str, subtitle: Option<String>, fields: Vec<(&str, String)>) -> String {
        let width = fields.iter().map(|(label, _)| label.width()).max().unwrap_or(0);
        let data = DetailData {
            title: title.to_string(),
            subtitle,
            fields: fields
                .into_iter()
                .map(|(label, value)| DetailField {
                    label: format!("{}{}", label, pad_for(label, width)),
                    value,
                })
                .collect(),
        };
        self.render(DETAIL_TEMPLATE, &data)
    }
}

fn record_line(id: &Uuid, title: &str, detail: &str, created_at: DateTime<Utc>, is_deleted: bool) -> RecordLine {
    let title = truncate_to_width(title, TITLE_WIDTH);
    let detail = truncate_to_width(detail, DETAIL_WIDTH);
    RecordLine {
        id: short_id(id),
        padding: pad_for(&title, TITLE_WIDTH),
        detail_padding: pad_for(&detail, DETAIL_WIDTH),
        title,
        detail,
        time_ago: format_time_ago(created_at),
        is_deleted,
    }
}

/// One field per value; the label only on the first.
fn push_each(fields: &mut Vec<(&'static str, String)>, label: &'static str, values: &[String]) {
    for (i, value) in values.iter().enumerate() {
        fields.push((if i == 0 { label } else { "" }, value.clone()));
    }
}

fn collect_form_lines(node: &FormNode, depth: usize, out: &mut Vec<FormLine>) {
    let indent = "  ".repeat(depth);
    match node {
        FormNode::Field {
            label,
            path,
            control,
            value,
        } => out.push(FormLine {
            indent,
            label: if label.is_empty() { "value".to_string() } else { label.clone() },
            path: path.to_string(),
            control: format!("[{}]", control_name(*control)),
            value: field_value(value),
            is_field: true,
        }),
        FormNode::Group { label, path, children } => {
            if path.is_root() {
                children.iter().for_each(|c| collect_form_lines(c, depth, out));
                return;
            }
            out.push(section_line(indent, label, &path.to_string()));
            children.iter().for_each(|c| collect_form_lines(c, depth + 1, out));
        }
        FormNode::List { label, path, items } => {
            let child_depth = if path.is_root() {
                depth
            } else {
                let heading = format!("{} ({} items)", label, items.len());
                out.push(section_line(indent, &heading, &path.to_string()));
                depth + 1
            };
            items.iter().for_each(|c| collect_form_lines(c, child_depth, out));
        }
    }
}

fn section_line(indent: String, label: &str, path: &str) -> FormLine {
    FormLine {
        indent,
        label: label.to_string(),
        path: path.to_string(),
        control: String::new(),
        value: String::new(),
        is_field: false,
    }
}

fn control_name(control: Control) -> &'static str {
    match control {
        Control::SingleLine => "text",
        Control::MultiLine => "textarea",
        Control::Number => "number",
        Control::Checkbox => "checkbox",
        Control::Null => "empty",
    }
}

/// A leaf value on one line.
fn field_value(value: &Json) -> String {
    match value {
        Json::String(s) => {
            let mut lines = s.lines();
            let first = lines.next().unwrap_or("");
            let shown = truncate_to_width(first, FIELD_VALUE_WIDTH);
            if lines.next().is_some() && !shown.ends_with('…') {
                format!("{}…", shown)
            } else {
                shown
            }
        }
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn tally_lines(tallies: &[Tally]) -> Vec<TallyLine> {
    let name_width = tallies.iter().map(|t| t.name.width()).max().unwrap_or(0);
    let count_width = tallies.iter().map(|t| t.count.to_string().len()).max().unwrap_or(0);
    tallies
        .iter()
        .map(|t| TallyLine {
            name: format!("{}{}", t.name, pad_for(&t.name, name_width)),
            count: format!("{:>width$}", t.count, width = count_width),
        })
        .collect()
}

fn bar_length(value: usize, max: usize) -> usize {
    if max == 0 || value == 0 {
        return 0;
    }
    (value * BAR_WIDTH).div_ceil(max)
}

fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(ID_WIDTH).collect()
}

fn pad_for(text: &str, width: usize) -> String {
    " ".repeat(width.saturating_sub(text.width()))
}

/// Thousands separated by spaces: `120 000 000`.
fn format_price(price: f64) -> String {
    let whole = price.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    if whole < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let limit = max_width.saturating_sub(1);
    let mut result = String::new();
    let mut current = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if current + w > limit {
            break;
        }
        result.push(c);
        current += w;
    }
    result.push('…');
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let elapsed = Utc::now()
        .signed_duration_since(timestamp)
        .to_std()
        .unwrap_or_default();
    let text = timeago::Formatter::new().convert(elapsed);

    // Units are right-aligned to the width of "seconds" so columns line up:
    //   3 seconds ago
    //   1     day ago
    let aligned = match text.split_once(' ') {
        Some((n, rest)) => match rest.strip_suffix(" ago") {
            Some(unit) => format!("{} {:>7} ago", n, unit),
            None => text.clone(),
        },
        None => text.clone(),
    };
    format!("{:>width$}", aligned, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabinetapp::model::{AppointmentStatus, ListingType, PropertySummary};
    use chrono::{Duration, NaiveDate};
    use serde_json::json;

    fn property(title: &str, deleted: bool) -> Property {
        Property {
            id: Uuid::new_v4(),
            created_at: Utc::now() - Duration::days(2),
            title: title.to_string(),
            description: "4 pièces".to_string(),
            listing_type: ListingType::Vente,
            property_type: "maison".to_string(),
            price: 120_000_000.0,
            location: "Cocody, Abidjan".to_string(),
            surface: 350.0,
            rooms: Some(4),
            architecture_style: None,
            images: vec!["https://cdn/a.jpg".into(), "https://cdn/b.jpg".into()],
            videos: vec![],
            deleted_at: deleted.then(Utc::now),
        }
    }

    fn appointment(name: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            first_name: None,
            last_name: None,
            full_name: Some(name.to_string()),
            email: Some("awa@example.ci".into()),
            phone: Some("0707843777".into()),
            client_type: None,
            consultation_type: None,
            online_platform: None,
            consultation_object: Some("Succession".into()),
            consultation_summary: None,
            desired_date: NaiveDate::from_ymd_opt(2030, 6, 3).unwrap(),
            appointment_time: Some("9:00".into()),
            payment_receipt_url: None,
            property_id: None,
            message: None,
            status,
        }
    }

    #[test]
    fn messages_render_one_per_line() {
        let out = Output::plain().messages(&[CmdMessage::success("Saved"), CmdMessage::warning("Careful")]);
        assert_eq!(out, "Saved\nCareful\n");
        assert_eq!(Output::plain().messages(&[]), "");
    }

    #[test]
    fn property_types_list_names() {
        let types = [PropertyType {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name: "terrain".into(),
            deleted_at: None,
        }];
        let out = Output::plain().property_types(&types);
        assert!(out.contains("terrain"));
        assert_eq!(Output::plain().property_types(&[]).trim(), "No property types.");
    }

    #[test]
    fn empty_property_list_says_so() {
        assert_eq!(Output::plain().properties(&[]).trim(), "No properties found.");
    }

    #[test]
    fn property_rows_show_short_id_and_price() {
        let p = property("Villa Cocody", false);
        let out = Output::plain().properties(std::slice::from_ref(&p));
        assert!(out.starts_with(&p.id.to_string()[..ID_WIDTH]));
        assert!(out.contains("Villa Cocody"));
        assert!(out.contains("120 000 000 FCFA"));
        assert!(out.contains("days ago"));
    }

    #[test]
    fn long_titles_are_truncated_and_columns_align() {
        let long = "Immeuble de rapport avec six appartements et deux commerces";
        let out = Output::plain().properties(&[property(long, false), property("Studio", true)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains('…'));
        let column = |line: &str| line[..line.find("vente").unwrap()].width();
        assert_eq!(column(lines[0]), column(lines[1]));
    }

    #[test]
    fn property_detail_lists_every_image() {
        let out = Output::plain().property(&property("Villa", false));
        assert!(out.starts_with("Villa\n"));
        assert!(out.contains("https://cdn/a.jpg"));
        assert!(out.contains("https://cdn/b.jpg"));
        assert!(out.contains("350 m²"));
    }

    #[test]
    fn form_lines_carry_paths_and_controls() {
        let doc = json!({
            "hero": { "title": "Bienvenue", "visible": true },
            "items": [ { "label": "Conseil" } ],
            "count": 3,
            "note": null
        });
        let out = Output::plain().form(&content::render(&doc));
        assert!(out.contains("title hero.title [text] Bienvenue"));
        assert!(out.contains("visible hero.visible [checkbox] true"));
        assert!(out.contains("items (1 items) items"));
        assert!(out.contains("    label items.0.label [text] Conseil"));
        assert!(out.contains("count count [number] 3"));
        assert!(out.contains("note note [empty]"));
    }

    #[test]
    fn long_text_is_a_textarea_on_one_line() {
        let doc = json!({ "body": format!("{}\nsecond line", "a".repeat(120)) });
        let out = Output::plain().form(&content::render(&doc));
        assert!(out.contains("[textarea]"));
        assert_eq!(out.lines().count(), 1);
        assert!(out.trim_end().ends_with('…'));
    }

    #[test]
    fn appointments_show_status_and_subject() {
        let consult = AppointmentEntry {
            appointment: appointment("Awa Traoré", AppointmentStatus::Pending),
            property: None,
        };
        let visit = AppointmentEntry {
            appointment: appointment("Koffi Yao", AppointmentStatus::Approved),
            property: Some(PropertySummary {
                title: "Villa".into(),
                location: "Cocody".into(),
                listing_type: ListingType::Vente,
            }),
        };
        let out = Output::plain().appointments(&[consult, visit]);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("2030-06-03  9:00"));
        assert!(lines[0].contains("pending"));
        assert!(lines[0].contains("Succession"));
        assert!(lines[1].contains("approved"));
        assert!(lines[1].contains("visit: Villa (Cocody)"));
        assert_eq!(Output::plain().appointments(&[]).trim(), "No appointments.");
    }

    #[test]
    fn visit_bars_scale_to_the_busiest_period() {
        let counts = vec![
            VisitCount { period: "2030-06-01".into(), visits: 10 },
            VisitCount { period: "2030-06-02".into(), visits: 5 },
        ];
        let out = Output::plain().visits(&counts, Timeframe::Day);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Visits by day");
        assert_eq!(lines[1].matches('█').count(), BAR_WIDTH);
        assert_eq!(lines[2].matches('█').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn searches_have_two_sections() {
        let breakdown = SearchBreakdown {
            by_location: vec![Tally { name: "Cocody".into(), count: 3 }],
            by_type: vec![],
        };
        let out = Output::plain().searches(&breakdown);
        assert!(out.contains("By location\n  Cocody  3\n"));
        assert!(out.contains("By type\nNo searches recorded."));
    }

    #[test]
    fn config_marks_unset_values() {
        let out = Output::plain().config(&[("backend", "fs".into()), ("api_url", String::new())]);
        assert!(out.contains("backend  fs"));
        assert!(out.contains("api_url  (unset)"));
    }

    #[test]
    fn prices_group_thousands() {
        assert_eq!(format_price(120_000_000.0), "120 000 000");
        assert_eq!(format_price(1500.0), "1 500");
        assert_eq!(format_price(950.0), "950");
    }

    #[test]
    fn truncation_respects_wide_chars() {
        assert_eq!(truncate_to_width("short", 10), "short");
        let t = truncate_to_width("日本語のタイトル", 7);
        assert!(t.width() <= 7);
        assert!(t.ends_with('…'));
    }

    #[test]
    fn time_ago_is_fixed_width() {
        let out = format_time_ago(Utc::now() - Duration::days(1));
        assert_eq!(out.width(), TIME_WIDTH);
        assert!(out.ends_with("day ago"));
    }
}
