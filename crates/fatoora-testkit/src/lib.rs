// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use fatoora_app::{
    Channel, FieldName, FormKind, FormState, InvoiceDraft, InvoiceRecord, InvoiceStatus,
};
use std::path::PathBuf;
use time::macros::{date, format_description};
use time::{Date, Duration};

const FIRST_NAMES: [&str; 16] = [
    "Layla", "Omar", "Noor", "Ali", "Huda", "Yusuf", "Maryam", "Hamad", "Fatima", "Khalid",
    "Aisha", "Salman", "Zainab", "Isa", "Reem", "Jassim",
];

const COMPANIES: [&str; 10] = [
    "Pearl Trading",
    "Seef Logistics",
    "Muharraq Bakery",
    "Riffa Motors",
    "Juffair Dental",
    "Amwaj Marine",
    "Manama Print House",
    "Sitra Steel",
    "Hidd Cold Stores",
    "Budaiya Farms",
];

const REMARKS: [&str; 8] = [
    "Monthly rent",
    "Catering order",
    "Maintenance visit",
    "Consulting hours",
    "Spare parts",
    "Annual subscription",
    "Delivery charges",
    "",
];

const EMAIL_DOMAINS: [&str; 4] = [
    "example.bh",
    "mail.example.com",
    "batelco.example",
    "corp.example",
];

/// First listing date handed out; later records step forward from here.
const REFERENCE_DATE: Date = date!(2026-01-04);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for invoice listings and filled-in forms. The same seed
/// always yields the same data.
#[derive(Debug, Clone)]
pub struct InvoiceFaker {
    rng: DeterministicRng,
    next_id: u64,
    day: i64,
}

impl InvoiceFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1001,
            day: 0,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// Always passes the name validator: one ASCII word.
    pub fn customer_name(&mut self) -> String {
        self.pick(&FIRST_NAMES).to_owned()
    }

    /// Eight digits with a Bahraini mobile prefix.
    pub fn mobile(&mut self) -> String {
        let prefix = self.pick(&["33", "34", "36", "37", "39"]);
        let rest = self.rng.next_u64() % 1_000_000;
        format!("{prefix}{rest:06}")
    }

    pub fn email_for(&mut self, name: &str) -> String {
        format!(
            "{}@{}",
            name.to_ascii_lowercase(),
            self.pick(&EMAIL_DOMAINS)
        )
    }

    /// Fils are kept to three places like the BHD amounts on real invoices.
    pub fn amount(&mut self) -> String {
        let fils = 500 + self.rng.next_u64() % 499_500;
        format!("{}.{:03}", fils / 1000, fils % 1000)
    }

    pub fn status(&mut self) -> InvoiceStatus {
        InvoiceStatus::KNOWN[self.rng.int_n(InvoiceStatus::KNOWN.len())].clone()
    }

    pub fn invoice_record(&mut self) -> InvoiceRecord {
        let id = self.next_id;
        self.next_id += 1;
        self.day += 1 + self.rng.int_n(3) as i64;
        let day = REFERENCE_DATE + Duration::days(self.day);
        let customer = if self.rng.bool() {
            self.customer_name()
        } else {
            self.pick(&COMPANIES).to_owned()
        };
        InvoiceRecord {
            id: id.to_string(),
            date: listing_iso_date(day),
            formatted_date: Some(listing_date(day)),
            customer,
            phone: format!("+973 {}", self.mobile()),
            status: self.status(),
            amount: self.amount(),
            remarks: self.pick(&REMARKS).to_owned(),
        }
    }

    pub fn invoices(&mut self, count: usize) -> Vec<InvoiceRecord> {
        (0..count).map(|_| self.invoice_record()).collect()
    }

    /// A form whose validated fields all pass, with no channel selected.
    pub fn valid_form(&mut self, kind: FormKind) -> FormState {
        let mut form = FormState::new(kind);
        let name = self.customer_name();
        let values = [
            (FieldName::Mobile, self.mobile()),
            (FieldName::Email, self.email_for(&name)),
            (FieldName::CustomerName, name),
            (FieldName::Amount, self.amount()),
            (FieldName::Notes, self.pick(&REMARKS).to_owned()),
        ];
        for (field, value) in values {
            // Every kind owns these fields, so updates cannot fail.
            let _ = form.update_field(field, &value);
        }
        if kind == FormKind::Recurring {
            let start = listing_iso_date(REFERENCE_DATE + Duration::days(self.day));
            let _ = form.update_field(FieldName::StartDate, &start);
            let _ = form.update_field(FieldName::RepeatEvery, "1");
        }
        form
    }

    pub fn draft(&mut self, kind: FormKind) -> InvoiceDraft {
        let mut form = self.valid_form(kind);
        if self.rng.bool() {
            form.set_channel(Channel::ALL[self.rng.int_n(Channel::ALL.len())], true);
        }
        form.to_draft()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

fn listing_date(date: Date) -> String {
    date.format(format_description!("[day] [month repr:short] [year]"))
        .unwrap_or_else(|_| date.to_string())
}

fn listing_iso_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("drafts.db");
    Ok((dir, db_path))
}
