// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::dispatch::{self, DraftStore, InvoiceSender, Submission};
use crate::forms::{FieldName, FormState};
use crate::listing::{ListingState, page_count, search_records};
use crate::notify::Notification;
use crate::{
    Channel, FormKind, InvoiceRecord, Language, ListingTab, PageSize, SavedDraft, StatusFilter,
    View,
};

/// Identifies one listing fetch so late results from an abandoned request
/// can be told apart from the current one.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub view: View,
    pub form: Option<FormState>,
    pub listing: ListingState,
    pub filter: StatusFilter,
    pub search: String,
    pub listing_tab: ListingTab,
    pub page_size: PageSize,
    pub page: usize,
    pub drafts: Vec<SavedDraft>,
    pub default_language: Language,
    pub toast: Option<Notification>,
    inflight: Option<RequestId>,
    next_request: RequestId,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: View::Dashboard,
            form: None,
            listing: ListingState::default(),
            filter: StatusFilter::All,
            search: String::new(),
            listing_tab: ListingTab::default(),
            page_size: PageSize::default(),
            page: 0,
            drafts: Vec::new(),
            default_language: Language::default(),
            toast: None,
            inflight: None,
            next_request: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Navigate(View),
    RefreshListing,
    ListingLoaded {
        request: RequestId,
        result: Result<Vec<InvoiceRecord>, String>,
    },
    DraftsLoaded(Vec<SavedDraft>),
    SetFilter(StatusFilter),
    NextFilter,
    PrevFilter,
    SetSearch(String),
    ToggleListingTab,
    NextPage,
    PrevPage,
    CyclePageSize,
    UpdateField(FieldName, String),
    ToggleChannel(Channel),
    ToggleLanguage,
    CycleFrequency,
    CycleEndCondition,
    RevealErrors,
    Notify(Notification),
    ClearToast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ViewChanged(View),
    FormMounted(FormKind),
    FormUnmounted(FormKind),
    FetchRequested(RequestId),
    FetchCancelled(RequestId),
    ListingUpdated,
    StaleListingIgnored(RequestId),
    DraftsUpdated,
    FilterChanged(StatusFilter),
    SearchChanged,
    ListingTabChanged(ListingTab),
    PageChanged(usize),
    PageSizeChanged(PageSize),
    FieldUpdated { field: FieldName, form_valid: bool },
    FormChanged,
    ToastShown(Notification),
    ToastCleared,
    Rejected(String),
}

impl AppState {
    pub fn with_start(view: View, page_size: PageSize, language: Language) -> Self {
        Self {
            page_size,
            default_language: language,
            ..Self::default()
        }
        .mounted(view)
    }

    // Startup events are dropped; the caller reads `pending_fetch` instead.
    fn mounted(mut self, view: View) -> Self {
        if view == View::Dashboard {
            self.start_fetch();
        } else {
            self.navigate(view);
        }
        self
    }

    /// Request id the UI should be fetching for, if any.
    pub fn pending_fetch(&self) -> Option<RequestId> {
        self.inflight
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::Navigate(view) => self.navigate(view),
            AppCommand::RefreshListing => {
                if self.view != View::Dashboard {
                    return vec![self.reject("listing is only refreshed on the dashboard")];
                }
                let mut events = self.cancel_fetch();
                events.push(self.start_fetch());
                events
            }
            AppCommand::ListingLoaded { request, result } => {
                if self.inflight != Some(request) {
                    return vec![AppEvent::StaleListingIgnored(request)];
                }
                self.inflight = None;
                self.listing.finish(result);
                self.page = 0;
                vec![AppEvent::ListingUpdated]
            }
            AppCommand::DraftsLoaded(drafts) => {
                self.drafts = drafts;
                vec![AppEvent::DraftsUpdated]
            }
            AppCommand::SetFilter(filter) => self.set_filter(filter),
            AppCommand::NextFilter => self.rotate_filter(1),
            AppCommand::PrevFilter => self.rotate_filter(-1),
            AppCommand::SetSearch(query) => {
                self.search = query;
                self.page = 0;
                vec![AppEvent::SearchChanged]
            }
            AppCommand::ToggleListingTab => {
                self.listing_tab = self.listing_tab.toggled();
                self.page = 0;
                vec![AppEvent::ListingTabChanged(self.listing_tab)]
            }
            AppCommand::NextPage => {
                let last = page_count(self.visible_len(), self.page_size) - 1;
                self.page = (self.page + 1).min(last);
                vec![AppEvent::PageChanged(self.page)]
            }
            AppCommand::PrevPage => {
                self.page = self.page.saturating_sub(1);
                vec![AppEvent::PageChanged(self.page)]
            }
            AppCommand::CyclePageSize => {
                self.page_size = self.page_size.next();
                self.page = 0;
                vec![AppEvent::PageSizeChanged(self.page_size)]
            }
            AppCommand::UpdateField(field, raw) => {
                let Some(form) = self.form.as_mut() else {
                    return vec![self.reject("no form is open")];
                };
                match form.update_field(field, &raw) {
                    Ok(form_valid) => vec![AppEvent::FieldUpdated { field, form_valid }],
                    Err(error) => vec![self.reject(&error.to_string())],
                }
            }
            AppCommand::ToggleChannel(channel) => self.with_form(|form| {
                form.toggle_channel(channel);
                Ok(())
            }),
            AppCommand::ToggleLanguage => self.with_form(|form| {
                form.language = form.language.toggled();
                Ok(())
            }),
            AppCommand::CycleFrequency => {
                self.with_form(|form| form.cycle_frequency().map(|_| ()))
            }
            AppCommand::CycleEndCondition => {
                self.with_form(|form| form.cycle_end_condition().map(|_| ()))
            }
            AppCommand::RevealErrors => self.with_form(|form| {
                form.reveal_errors();
                Ok(())
            }),
            AppCommand::Notify(notification) => vec![self.show_toast(notification)],
            AppCommand::ClearToast => {
                self.toast = None;
                vec![AppEvent::ToastCleared]
            }
        }
    }

    /// Saves the open form as a draft and shows the outcome.
    pub fn save_draft(&mut self, store: &mut dyn DraftStore) -> Vec<AppEvent> {
        let Some(form) = self.form.as_ref() else {
            return vec![self.reject("no form is open")];
        };
        let notification = dispatch::save_draft(form, store);
        vec![self.show_toast(notification)]
    }

    /// Submits the open form. A blocked submit reveals the field errors and,
    /// for the recurring form, shows an error toast.
    pub fn submit(
        &mut self,
        store: &mut dyn DraftStore,
        sender: &mut dyn InvoiceSender,
    ) -> (Option<Submission>, Vec<AppEvent>) {
        let Some(form) = self.form.as_mut() else {
            return (None, vec![self.reject("no form is open")]);
        };
        match dispatch::submit(form, store, sender) {
            Ok(submission) => {
                let toast = self.show_toast(submission.notification());
                (Some(submission), vec![toast])
            }
            Err(blocked) => {
                form.reveal_errors();
                let mut events = vec![AppEvent::FormChanged];
                if let Some(notification) = blocked.notification() {
                    events.push(self.show_toast(notification));
                }
                (None, events)
            }
        }
    }

    /// Listing rows after the status filter and the search box.
    pub fn visible_records(&self) -> Vec<InvoiceRecord> {
        search_records(&self.listing.visible(&self.filter), &self.search)
    }

    fn visible_len(&self) -> usize {
        match self.listing_tab {
            ListingTab::Invoices => self.visible_records().len(),
            ListingTab::Drafts => self.drafts.len(),
        }
    }

    fn navigate(&mut self, view: View) -> Vec<AppEvent> {
        if view == self.view && (self.form.is_some() || view == View::Dashboard) {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.view == View::Dashboard {
            events.extend(self.cancel_fetch());
        }
        if let Some(form) = self.form.take() {
            events.push(AppEvent::FormUnmounted(form.kind()));
        }
        self.view = view;
        events.push(AppEvent::ViewChanged(view));
        match view.form_kind() {
            Some(kind) => {
                let mut form = FormState::new(kind);
                form.language = self.default_language;
                self.form = Some(form);
                events.push(AppEvent::FormMounted(kind));
            }
            None => events.push(self.start_fetch()),
        }
        events
    }

    fn start_fetch(&mut self) -> AppEvent {
        let request = self.next_request;
        self.next_request += 1;
        self.inflight = Some(request);
        self.listing.begin_loading();
        AppEvent::FetchRequested(request)
    }

    fn cancel_fetch(&mut self) -> Vec<AppEvent> {
        match self.inflight.take() {
            Some(request) => {
                if let ListingState::Loading { previous } = &self.listing {
                    self.listing = match previous.clone() {
                        Some(records) => ListingState::Loaded(records),
                        None => ListingState::NotLoaded,
                    };
                }
                vec![AppEvent::FetchCancelled(request)]
            }
            None => Vec::new(),
        }
    }

    fn set_filter(&mut self, filter: StatusFilter) -> Vec<AppEvent> {
        self.filter = filter;
        self.page = 0;
        vec![AppEvent::FilterChanged(self.filter.clone())]
    }

    fn rotate_filter(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = StatusFilter::tabs();
        let current = tabs
            .iter()
            .position(|tab| *tab == self.filter)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.set_filter(tabs[next].clone())
    }

    fn with_form(
        &mut self,
        change: impl FnOnce(&mut FormState) -> Result<(), crate::forms::FormError>,
    ) -> Vec<AppEvent> {
        let Some(form) = self.form.as_mut() else {
            return vec![self.reject("no form is open")];
        };
        match change(form) {
            Ok(()) => vec![AppEvent::FormChanged],
            Err(error) => vec![self.reject(&error.to_string())],
        }
    }

    fn show_toast(&mut self, notification: Notification) -> AppEvent {
        self.toast = Some(notification.clone());
        AppEvent::ToastShown(notification)
    }

    fn reject(&self, reason: &str) -> AppEvent {
        AppEvent::Rejected(reason.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::{AppCommand, AppEvent, AppState};
    use crate::dispatch::{DraftStore, FIX_ERRORS_MESSAGE, InvoiceSender};
    use crate::forms::FieldName;
    use crate::listing::ListingState;
    use crate::notify::Notification;
    use crate::{
        Channel, DraftId, FormKind, InvoiceDraft, InvoiceRecord, InvoiceStatus, Language,
        ListingTab, PageSize, SendChannels, StatusFilter, View,
    };

    struct NullStore;

    impl DraftStore for NullStore {
        fn save_draft(&mut self, _draft: &InvoiceDraft) -> Result<DraftId> {
            Ok(DraftId::new(7))
        }
    }

    struct NullSender;

    impl InvoiceSender for NullSender {
        fn send(&mut self, _draft: &InvoiceDraft, _channels: SendChannels) -> Result<()> {
            Ok(())
        }
    }

    fn record(id: &str, status: InvoiceStatus) -> InvoiceRecord {
        InvoiceRecord {
            id: id.to_owned(),
            date: String::new(),
            formatted_date: None,
            customer: format!("customer {id}"),
            phone: String::new(),
            status,
            amount: "1".to_owned(),
            remarks: String::new(),
        }
    }

    #[test]
    fn startup_on_dashboard_requests_fetch() {
        let state = AppState::with_start(View::Dashboard, PageSize::Twenty, Language::Arabic);
        assert_eq!(state.pending_fetch(), Some(1));
        assert!(state.listing.is_loading());
        assert_eq!(state.page_size, PageSize::Twenty);
    }

    #[test]
    fn startup_on_form_mounts_it_with_default_language() {
        let state = AppState::with_start(View::RecurringInvoice, PageSize::Ten, Language::Arabic);
        assert_eq!(state.pending_fetch(), None);
        let form = state.form.as_ref().expect("form mounted");
        assert_eq!(form.kind(), FormKind::Recurring);
        assert_eq!(form.language, Language::Arabic);
    }

    #[test]
    fn leaving_dashboard_cancels_fetch_and_ignores_late_result() {
        let mut state = AppState::with_start(View::Dashboard, PageSize::Ten, Language::English);
        let request = state.pending_fetch().expect("fetch started");

        let events = state.dispatch(AppCommand::Navigate(View::CreateInvoice));
        assert_eq!(
            events,
            vec![
                AppEvent::FetchCancelled(request),
                AppEvent::ViewChanged(View::CreateInvoice),
                AppEvent::FormMounted(FormKind::OneOff),
            ]
        );
        assert_eq!(state.listing, ListingState::NotLoaded);

        let late = state.dispatch(AppCommand::ListingLoaded {
            request,
            result: Ok(vec![record("1", InvoiceStatus::Paid)]),
        });
        assert_eq!(late, vec![AppEvent::StaleListingIgnored(request)]);
        assert!(state.listing.records().is_empty());
    }

    #[test]
    fn returning_to_dashboard_discards_form_and_refetches() {
        let mut state = AppState::with_start(View::CreateInvoice, PageSize::Ten, Language::English);
        state.dispatch(AppCommand::UpdateField(FieldName::Mobile, "36112233".to_owned()));

        let events = state.dispatch(AppCommand::Navigate(View::Dashboard));
        assert_eq!(
            events,
            vec![
                AppEvent::FormUnmounted(FormKind::OneOff),
                AppEvent::ViewChanged(View::Dashboard),
                AppEvent::FetchRequested(1),
            ]
        );
        assert!(state.form.is_none());

        state.dispatch(AppCommand::Navigate(View::CreateInvoice));
        let form = state.form.as_ref().expect("fresh form");
        assert_eq!(form.value(FieldName::Mobile), "");
    }

    #[test]
    fn listing_result_replaces_collection_and_filters() {
        let mut state = AppState::with_start(View::Dashboard, PageSize::Ten, Language::English);
        let request = state.pending_fetch().expect("fetch started");
        state.dispatch(AppCommand::ListingLoaded {
            request,
            result: Ok(vec![
                record("1", InvoiceStatus::Paid),
                record("2", InvoiceStatus::Overdue),
            ]),
        });
        assert_eq!(state.pending_fetch(), None);
        assert_eq!(state.visible_records().len(), 2);

        state.dispatch(AppCommand::NextFilter);
        assert_eq!(
            state.filter,
            StatusFilter::Only(InvoiceStatus::AwaitingPayment)
        );
        assert!(state.visible_records().is_empty());

        state.dispatch(AppCommand::SetFilter(StatusFilter::Only(InvoiceStatus::Paid)));
        assert_eq!(state.visible_records()[0].id, "1");

        state.dispatch(AppCommand::PrevFilter);
        assert_eq!(state.filter, StatusFilter::Only(InvoiceStatus::Overdue));

        state.dispatch(AppCommand::SetFilter(StatusFilter::All));
        state.dispatch(AppCommand::SetSearch("customer 2".to_owned()));
        assert_eq!(state.visible_records().len(), 1);
    }

    #[test]
    fn refresh_replaces_inflight_request() {
        let mut state = AppState::with_start(View::Dashboard, PageSize::Ten, Language::English);
        let events = state.dispatch(AppCommand::RefreshListing);
        assert_eq!(
            events,
            vec![AppEvent::FetchCancelled(1), AppEvent::FetchRequested(2)]
        );

        state.dispatch(AppCommand::Navigate(View::CreateInvoice));
        let rejected = state.dispatch(AppCommand::RefreshListing);
        assert!(matches!(rejected[0], AppEvent::Rejected(_)));
    }

    #[test]
    fn paging_stays_in_range() {
        let mut state = AppState::with_start(View::Dashboard, PageSize::Ten, Language::English);
        let request = state.pending_fetch().expect("fetch started");
        let records = (0..15)
            .map(|i| record(&i.to_string(), InvoiceStatus::Paid))
            .collect();
        state.dispatch(AppCommand::ListingLoaded {
            request,
            result: Ok(records),
        });

        state.dispatch(AppCommand::NextPage);
        state.dispatch(AppCommand::NextPage);
        assert_eq!(state.page, 1);
        state.dispatch(AppCommand::CyclePageSize);
        assert_eq!(state.page, 0);
        assert_eq!(state.page_size, PageSize::Twenty);
        state.dispatch(AppCommand::PrevPage);
        assert_eq!(state.page, 0);

        state.dispatch(AppCommand::ToggleListingTab);
        assert_eq!(state.listing_tab, ListingTab::Drafts);
    }

    #[test]
    fn field_updates_report_validity() {
        let mut state = AppState::with_start(View::CreateInvoice, PageSize::Ten, Language::English);
        state.dispatch(AppCommand::UpdateField(FieldName::Mobile, "36112233".to_owned()));
        let events =
            state.dispatch(AppCommand::UpdateField(FieldName::Email, "a@b.com".to_owned()));
        assert_eq!(
            events,
            vec![AppEvent::FieldUpdated {
                field: FieldName::Email,
                form_valid: true,
            }]
        );

        let rejected = state.dispatch(AppCommand::CycleFrequency);
        assert!(matches!(rejected[0], AppEvent::Rejected(_)));
    }

    #[test]
    fn submit_routes_through_dispatcher_and_shows_toast() {
        let mut state = AppState::with_start(View::CreateInvoice, PageSize::Ten, Language::English);
        state.dispatch(AppCommand::UpdateField(FieldName::Mobile, "36112233".to_owned()));
        state.dispatch(AppCommand::UpdateField(FieldName::Email, "a@b.com".to_owned()));
        state.dispatch(AppCommand::ToggleChannel(Channel::Sms));

        let (submission, events) = state.submit(&mut NullStore, &mut NullSender);
        assert!(submission.expect("submitted").succeeded());
        assert!(matches!(events[0], AppEvent::ToastShown(_)));
        assert_eq!(
            state.toast.as_ref().map(|toast| toast.message.as_str()),
            Some("Invoice sent via SMS.")
        );

        state.dispatch(AppCommand::ClearToast);
        assert!(state.toast.is_none());
    }

    #[test]
    fn blocked_recurring_submit_reveals_errors() {
        let mut state =
            AppState::with_start(View::RecurringInvoice, PageSize::Ten, Language::English);
        let (submission, _) = state.submit(&mut NullStore, &mut NullSender);
        assert!(submission.is_none());
        assert_eq!(state.toast, Some(Notification::error(FIX_ERRORS_MESSAGE)));
        let form = state.form.as_ref().expect("form");
        assert!(!form.error(FieldName::Mobile).is_empty());
    }

    #[test]
    fn save_draft_without_form_is_rejected() {
        let mut state = AppState::default();
        let events = state.save_draft(&mut NullStore);
        assert!(matches!(events[0], AppEvent::Rejected(_)));
    }
}
