// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::validation::{Validator, validate_email, validate_mobile, validate_name};
use crate::{
    COUNTRY_CODE, CURRENCY, Channel, EndCondition, FormKind, Frequency, InvoiceDraft, Language,
    RecurringSchedule, SendChannels,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldName {
    StartDate,
    RepeatEvery,
    Amount,
    Mobile,
    Email,
    CustomerName,
    Notes,
    Occurrences,
    EndDate,
}

impl FieldName {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartDate => "Invoice Start Date",
            Self::RepeatEvery => "Repeat Every",
            Self::Amount => "Amount (BHD)",
            Self::Mobile => "Mobile Number",
            Self::Email => "Email",
            Self::CustomerName => "Customer Name",
            Self::Notes => "Remarks",
            Self::Occurrences => "Occurrences",
            Self::EndDate => "End Date",
        }
    }

    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::StartDate | Self::EndDate => "YYYY-MM-DD",
            Self::RepeatEvery => "1",
            Self::Amount => "Enter Amount",
            Self::Mobile => "Enter Mobile Number",
            Self::Email => "Enter Email Address",
            Self::CustomerName => "Enter Customer Name",
            Self::Notes => "Write Purpose, Notes",
            Self::Occurrences => "Number of invoices",
        }
    }
}

impl FormKind {
    /// Every text field the form owns, in display order.
    pub const fn fields(self) -> &'static [FieldName] {
        match self {
            Self::OneOff => &[
                FieldName::Amount,
                FieldName::Mobile,
                FieldName::Email,
                FieldName::CustomerName,
                FieldName::Notes,
            ],
            Self::Recurring => &[
                FieldName::StartDate,
                FieldName::RepeatEvery,
                FieldName::Amount,
                FieldName::Mobile,
                FieldName::CustomerName,
                FieldName::Email,
                FieldName::Notes,
                FieldName::Occurrences,
                FieldName::EndDate,
            ],
        }
    }

    /// Fields whose validity gates submission.
    pub const fn validated_fields(self) -> &'static [FieldName] {
        match self {
            Self::OneOff => &[FieldName::Mobile, FieldName::Email],
            Self::Recurring => &[FieldName::Mobile, FieldName::Email, FieldName::CustomerName],
        }
    }

    pub fn validator_for(self, field: FieldName) -> Option<Validator> {
        match (self, field) {
            (_, FieldName::Mobile) => Some(validate_mobile),
            (_, FieldName::Email) => Some(validate_email),
            (Self::Recurring, FieldName::CustomerName) => Some(validate_name),
            _ => None,
        }
    }

    pub fn owns(self, field: FieldName) -> bool {
        self.fields().contains(&field)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValue {
    pub raw: String,
    pub error: String,
}

impl FieldValue {
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    UnknownField { kind: FormKind, field: FieldName },
    WrongKind { expected: FormKind, actual: FormKind },
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { kind, field } => {
                write!(f, "{} has no {} field", kind.title(), field.label())
            }
            Self::WrongKind { expected, actual } => {
                write!(
                    f,
                    "control only exists on the {} form, not the {} form",
                    expected.title(),
                    actual.title()
                )
            }
        }
    }
}

impl std::error::Error for FormError {}

/// One focusable element of a form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormControl {
    Language,
    Field(FieldName),
    Frequency,
    EndCondition,
    Channel(Channel),
    SaveDraft,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    kind: FormKind,
    fields: BTreeMap<FieldName, FieldValue>,
    pub send_via: SendChannels,
    pub language: Language,
    frequency: Option<Frequency>,
    end_condition: EndCondition,
}

impl FormState {
    pub fn new(kind: FormKind) -> Self {
        let fields = kind
            .fields()
            .iter()
            .map(|field| (*field, FieldValue::default()))
            .collect();
        Self {
            kind,
            fields,
            send_via: SendChannels::default(),
            language: Language::default(),
            frequency: None,
            end_condition: EndCondition::default(),
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn field(&self, name: FieldName) -> Option<&FieldValue> {
        self.fields.get(&name)
    }

    pub fn value(&self, name: FieldName) -> &str {
        self.fields
            .get(&name)
            .map_or("", |field| field.raw.as_str())
    }

    pub fn error(&self, name: FieldName) -> &str {
        self.fields
            .get(&name)
            .map_or("", |field| field.error.as_str())
    }

    /// Stores `raw` verbatim, re-runs the field's validator and returns the
    /// recomputed form validity.
    pub fn update_field(&mut self, name: FieldName, raw: &str) -> Result<bool, FormError> {
        let kind = self.kind;
        let field = self
            .fields
            .get_mut(&name)
            .ok_or(FormError::UnknownField { kind, field: name })?;
        field.raw = raw.to_owned();
        field.error = kind
            .validator_for(name)
            .map(|validate| validate(raw).message.to_owned())
            .unwrap_or_default();
        Ok(self.is_valid())
    }

    pub fn is_valid(&self) -> bool {
        self.kind.validated_fields().iter().all(|name| {
            self.kind
                .validator_for(*name)
                .is_none_or(|validate| validate(self.value(*name)).valid)
        })
    }

    /// Surfaces messages on validated fields the user never touched, so a
    /// blocked submit can show everything that is wrong at once.
    pub fn reveal_errors(&mut self) {
        let kind = self.kind;
        for name in kind.validated_fields() {
            if let (Some(validate), Some(field)) =
                (kind.validator_for(*name), self.fields.get_mut(name))
            {
                field.error = validate(&field.raw).message.to_owned();
            }
        }
    }

    pub fn invalid_fields(&self) -> Vec<FieldName> {
        self.kind
            .validated_fields()
            .iter()
            .copied()
            .filter(|name| {
                self.kind
                    .validator_for(*name)
                    .is_some_and(|validate| !validate(self.value(*name)).valid)
            })
            .collect()
    }

    pub fn set_channel(&mut self, channel: Channel, checked: bool) {
        self.send_via.set(channel, checked);
    }

    pub fn toggle_channel(&mut self, channel: Channel) {
        let checked = !self.send_via.contains(channel);
        self.send_via.set(channel, checked);
    }

    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    pub fn end_condition(&self) -> EndCondition {
        self.end_condition
    }

    pub fn set_frequency(&mut self, frequency: Option<Frequency>) -> Result<(), FormError> {
        self.require_recurring()?;
        self.frequency = frequency;
        Ok(())
    }

    /// Steps through "Select Frequency" and then each unit.
    pub fn cycle_frequency(&mut self) -> Result<Option<Frequency>, FormError> {
        self.require_recurring()?;
        self.frequency = match self.frequency {
            None => Some(Frequency::ALL[0]),
            Some(current) => Frequency::ALL
                .iter()
                .position(|candidate| *candidate == current)
                .and_then(|index| Frequency::ALL.get(index + 1).copied()),
        };
        Ok(self.frequency)
    }

    pub fn set_end_condition(&mut self, condition: EndCondition) -> Result<(), FormError> {
        self.require_recurring()?;
        self.end_condition = condition;
        Ok(())
    }

    pub fn cycle_end_condition(&mut self) -> Result<EndCondition, FormError> {
        self.require_recurring()?;
        let all = EndCondition::ALL;
        let index = all
            .iter()
            .position(|candidate| *candidate == self.end_condition)
            .unwrap_or(0);
        self.end_condition = all[(index + 1) % all.len()];
        Ok(self.end_condition)
    }

    fn require_recurring(&self) -> Result<(), FormError> {
        if self.kind == FormKind::Recurring {
            Ok(())
        } else {
            Err(FormError::WrongKind {
                expected: FormKind::Recurring,
                actual: self.kind,
            })
        }
    }

    /// Focusable controls in tab order. The occurrence count and end date
    /// only appear for the end condition that uses them.
    pub fn controls(&self) -> Vec<FormControl> {
        let mut controls = vec![FormControl::Language];
        match self.kind {
            FormKind::OneOff => {
                controls.extend(self.kind.fields().iter().map(|f| FormControl::Field(*f)));
            }
            FormKind::Recurring => {
                controls.push(FormControl::Field(FieldName::StartDate));
                controls.push(FormControl::Field(FieldName::RepeatEvery));
                controls.push(FormControl::Frequency);
                controls.push(FormControl::EndCondition);
                match self.end_condition {
                    EndCondition::Never => {}
                    EndCondition::AfterOccurrences => {
                        controls.push(FormControl::Field(FieldName::Occurrences));
                    }
                    EndCondition::OnDate => controls.push(FormControl::Field(FieldName::EndDate)),
                }
                controls.extend(
                    [
                        FieldName::Amount,
                        FieldName::Mobile,
                        FieldName::CustomerName,
                        FieldName::Email,
                        FieldName::Notes,
                    ]
                    .map(FormControl::Field),
                );
            }
        }
        controls.extend(Channel::ALL.map(FormControl::Channel));
        controls.push(FormControl::SaveDraft);
        controls.push(FormControl::Submit);
        controls
    }

    pub fn to_draft(&self) -> InvoiceDraft {
        let schedule = (self.kind == FormKind::Recurring).then(|| RecurringSchedule {
            start_date: self.value(FieldName::StartDate).to_owned(),
            repeat_every: self.value(FieldName::RepeatEvery).to_owned(),
            frequency: self.frequency,
            end_condition: self.end_condition,
            occurrences: match self.end_condition {
                EndCondition::AfterOccurrences => self.value(FieldName::Occurrences).to_owned(),
                _ => String::new(),
            },
            end_date: match self.end_condition {
                EndCondition::OnDate => self.value(FieldName::EndDate).to_owned(),
                _ => String::new(),
            },
        });
        InvoiceDraft {
            kind: self.kind,
            language: self.language,
            currency: CURRENCY.to_owned(),
            amount: self.value(FieldName::Amount).to_owned(),
            country_code: COUNTRY_CODE.to_owned(),
            mobile: self.value(FieldName::Mobile).to_owned(),
            email: self.value(FieldName::Email).to_owned(),
            customer_name: self.value(FieldName::CustomerName).to_owned(),
            notes: self.value(FieldName::Notes).to_owned(),
            send_via: self.send_via,
            schedule,
        }
    }
}
