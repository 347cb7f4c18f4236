// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

pub const CURRENCY: &str = "BHD";
pub const COUNTRY_CODE: &str = "+973";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DraftId(i64);

impl DraftId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Invoice status as reported by the listing endpoint. Statuses this client
/// does not know are kept verbatim so a single odd row cannot fail a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InvoiceStatus {
    AwaitingPayment,
    Overdue,
    Paid,
    Draft,
    Other(String),
}

impl InvoiceStatus {
    pub const KNOWN: [Self; 4] = [Self::AwaitingPayment, Self::Overdue, Self::Paid, Self::Draft];

    pub fn as_str(&self) -> &str {
        match self {
            Self::AwaitingPayment => "Awaiting Payment",
            Self::Overdue => "Overdue",
            Self::Paid => "Paid",
            Self::Draft => "Draft",
            Self::Other(value) => value,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "Awaiting Payment" => Self::AwaitingPayment,
            "Overdue" => Self::Overdue,
            "Paid" => Self::Paid,
            "Draft" => Self::Draft,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn badge(&self) -> StatusBadge {
        match self {
            Self::Paid => StatusBadge::Success,
            Self::Overdue => StatusBadge::Danger,
            _ => StatusBadge::Warning,
        }
    }
}

impl From<String> for InvoiceStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<InvoiceStatus> for String {
    fn from(value: InvoiceStatus) -> Self {
        value.as_str().to_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBadge {
    Success,
    Danger,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub date: String,
    /// Display form of `date` when the server sends one.
    #[serde(
        default,
        rename = "formattedDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub formatted_date: Option<String>,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub phone: String,
    pub status: InvoiceStatus,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default)]
    pub remarks: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Int(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
        Raw::Null(()) => String::new(),
    })
}

impl InvoiceRecord {
    pub fn display_date(&self) -> &str {
        self.formatted_date.as_deref().unwrap_or(&self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(InvoiceStatus),
}

impl StatusFilter {
    /// Selector tabs in display order.
    pub fn tabs() -> [Self; 4] {
        [
            Self::All,
            Self::Only(InvoiceStatus::AwaitingPayment),
            Self::Only(InvoiceStatus::Overdue),
            Self::Only(InvoiceStatus::Paid),
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "All",
            Self::Only(status) => status.as_str(),
        }
    }

    pub fn matches(&self, status: &InvoiceStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected == status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Email,
    Whatsapp,
}

impl Channel {
    pub const ALL: [Self; 3] = [Self::Sms, Self::Email, Self::Whatsapp];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Whatsapp => "whatsapp",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sms => "SMS",
            Self::Email => "Email",
            Self::Whatsapp => "WhatsApp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SendChannels {
    pub sms: bool,
    pub email: bool,
    pub whatsapp: bool,
}

impl SendChannels {
    pub const fn any(self) -> bool {
        self.sms || self.email || self.whatsapp
    }

    pub const fn contains(self, channel: Channel) -> bool {
        match channel {
            Channel::Sms => self.sms,
            Channel::Email => self.email,
            Channel::Whatsapp => self.whatsapp,
        }
    }

    pub fn set(&mut self, channel: Channel, checked: bool) {
        match channel {
            Channel::Sms => self.sms = checked,
            Channel::Email => self.email = checked,
            Channel::Whatsapp => self.whatsapp = checked,
        }
    }

    pub fn selected(self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|channel| self.contains(*channel))
            .collect()
    }

    pub fn describe(self) -> String {
        let labels = self
            .selected()
            .into_iter()
            .map(Channel::label)
            .collect::<Vec<_>>();
        if labels.is_empty() {
            "no channel".to_owned()
        } else {
            labels.join(", ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
}

impl Language {
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Arabic => "ar",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "en" => Some(Self::English),
            "ar" => Some(Self::Arabic),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::English => Self::Arabic,
            Self::Arabic => Self::English,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Day,
    Week,
    Month,
    Year,
}

impl Frequency {
    pub const ALL: [Self; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCondition {
    #[default]
    Never,
    AfterOccurrences,
    OnDate,
}

impl EndCondition {
    pub const ALL: [Self; 3] = [Self::Never, Self::AfterOccurrences, Self::OnDate];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Never => "Never",
            Self::AfterOccurrences => "After X Occurrences",
            Self::OnDate => "On a Specific Date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    OneOff,
    Recurring,
}

impl FormKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::OneOff => "new invoice",
            Self::Recurring => "new recurring invoice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Dashboard,
    CreateInvoice,
    RecurringInvoice,
}

impl View {
    pub const ALL: [Self; 3] = [Self::Dashboard, Self::CreateInvoice, Self::RecurringInvoice];

    pub const fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::CreateInvoice => "/create-invoice",
            Self::RecurringInvoice => "/recurring-invoice",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Self::Dashboard),
            "/create-invoice" | "create-invoice" => Some(Self::CreateInvoice),
            "/recurring-invoice" | "recurring-invoice" => Some(Self::RecurringInvoice),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::CreateInvoice => "new invoice",
            Self::RecurringInvoice => "new recurring",
        }
    }

    pub const fn form_kind(self) -> Option<FormKind> {
        match self {
            Self::Dashboard => None,
            Self::CreateInvoice => Some(FormKind::OneOff),
            Self::RecurringInvoice => Some(FormKind::Recurring),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingTab {
    #[default]
    Invoices,
    Drafts,
}

impl ListingTab {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Invoices => "Invoices",
            Self::Drafts => "Drafts",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Invoices => Self::Drafts,
            Self::Drafts => Self::Invoices,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    Ten,
    Twenty,
    Fifty,
}

impl PageSize {
    pub const fn rows(self) -> usize {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Fifty => 50,
        }
    }

    pub fn from_rows(rows: usize) -> Option<Self> {
        match rows {
            10 => Some(Self::Ten),
            20 => Some(Self::Twenty),
            50 => Some(Self::Fifty),
            _ => None,
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Ten => Self::Twenty,
            Self::Twenty => Self::Fifty,
            Self::Fifty => Self::Ten,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pub start_date: String,
    pub repeat_every: String,
    pub frequency: Option<Frequency>,
    pub end_condition: EndCondition,
    pub occurrences: String,
    pub end_date: String,
}

/// Everything a form hands to the draft store or the send gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub kind: FormKind,
    pub language: Language,
    pub currency: String,
    pub amount: String,
    pub country_code: String,
    pub mobile: String,
    pub email: String,
    pub customer_name: String,
    pub notes: String,
    pub send_via: SendChannels,
    pub schedule: Option<RecurringSchedule>,
}

impl InvoiceDraft {
    pub fn phone(&self) -> String {
        if self.mobile.is_empty() {
            return String::new();
        }
        format!("{} {}", self.country_code, self.mobile)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDraft {
    pub id: DraftId,
    pub draft: InvoiceDraft,
    pub checksum: String,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::{InvoiceRecord, InvoiceStatus, StatusBadge, StatusFilter, View};

    #[test]
    fn invoice_record_accepts_numeric_ids_and_formatted_date() {
        let record: InvoiceRecord = serde_json::from_str(
            r#"{"id":1042,"formattedDate":"12 Jan 2026","customer":"Layla","phone":"36112233","status":"Overdue","amount":12.5,"remarks":"rent"}"#,
        )
        .expect("record should decode");
        assert_eq!(record.id, "1042");
        assert_eq!(record.display_date(), "12 Jan 2026");
        assert_eq!(record.status, InvoiceStatus::Overdue);
        assert_eq!(record.amount, "12.5");
    }

    #[test]
    fn raw_and_formatted_dates_decode_side_by_side() {
        let records: Vec<InvoiceRecord> = serde_json::from_str(
            r#"[
                {"id":1,"date":"2026-03-01","formattedDate":"01 Mar 2026","status":"Paid"},
                {"id":2,"date":"2026-03-02","status":"Paid"}
            ]"#,
        )
        .expect("rows with both date keys should decode");
        assert_eq!(records[0].date, "2026-03-01");
        assert_eq!(records[0].display_date(), "01 Mar 2026");
        assert_eq!(records[1].display_date(), "2026-03-02");
    }

    #[test]
    fn unknown_status_is_preserved() {
        let record: InvoiceRecord =
            serde_json::from_str(r#"{"id":"INV-7","status":"Refunded"}"#).expect("decode");
        assert_eq!(record.status, InvoiceStatus::Other("Refunded".to_owned()));
        assert_eq!(record.status.as_str(), "Refunded");
        assert_eq!(record.status.badge(), StatusBadge::Warning);
        assert!(record.customer.is_empty());
    }

    #[test]
    fn status_badges_follow_status() {
        assert_eq!(InvoiceStatus::Paid.badge(), StatusBadge::Success);
        assert_eq!(InvoiceStatus::Overdue.badge(), StatusBadge::Danger);
        assert_eq!(InvoiceStatus::AwaitingPayment.badge(), StatusBadge::Warning);
    }

    #[test]
    fn filter_tabs_start_with_all() {
        let tabs = StatusFilter::tabs();
        assert_eq!(tabs[0], StatusFilter::All);
        assert_eq!(tabs[1].label(), "Awaiting Payment");
        assert!(!tabs.contains(&StatusFilter::Only(InvoiceStatus::Draft)));
    }

    #[test]
    fn view_paths_round_trip() {
        for view in View::ALL {
            assert_eq!(View::from_path(view.path()), Some(view));
        }
        assert_eq!(View::from_path("create-invoice"), Some(View::CreateInvoice));
        assert_eq!(View::from_path("/settings"), None);
    }
}
