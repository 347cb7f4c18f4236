// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use fatoora_app::{
    AppCommand, AppEvent, AppState, Channel, DraftId, DraftStore, FieldName, FormControl,
    FormKind, FormState, InvoiceRecord, InvoiceSender, ListingTab, Notification,
    NotificationLevel, RequestId, SavedDraft, StatusBadge, StatusFilter, Submission,
    TOAST_DURATION, View, page_count, paginate, status_counts,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const FOCUS_MARK: &str = "▸";
const SEARCH_HINT: &str = "SEARCH | type query | enter keep | esc clear";
const DASHBOARD_HINT: &str =
    "n/N new | tab/1-4 status | / search | d drafts | [/] page | p size | r refresh | ? help | q";
const INVOICE_COLUMNS: [&str; 7] = [
    "Invoice#",
    "Date",
    "Customer",
    "Phone",
    "Status",
    "Amount",
    "Remarks",
];
const DRAFT_COLUMNS: [&str; 6] = ["Draft#", "Saved", "Type", "Customer", "Phone", "Amount"];

/// Everything the UI needs from the outside world.
pub trait AppRuntime {
    fn fetch_invoices(&mut self) -> Result<Vec<InvoiceRecord>>;
    fn load_drafts(&mut self) -> Result<Vec<SavedDraft>>;
    fn delete_draft(&mut self, id: DraftId) -> Result<()>;
    fn collaborators(&mut self) -> (&mut dyn DraftStore, &mut dyn InvoiceSender);

    /// Starts the listing fetch for `request`. Runtimes that can fetch off
    /// the UI thread override this; the default fetches inline.
    fn spawn_listing_fetch(&mut self, request: RequestId, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.fetch_invoices().map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::Listing { request, result })
            .map_err(|_| anyhow!("listing event channel closed"))?;
        Ok(())
    }

    fn cancel_listing_fetch(&mut self, _request: RequestId) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearToast {
        token: u64,
    },
    Listing {
        request: RequestId,
        result: Result<Vec<InvoiceRecord>, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    focus: Option<FormControl>,
    search_editing: bool,
    row_cursor: usize,
    help_visible: bool,
    toast_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Some(request) = state.pending_fetch() {
        handle_app_events(
            state,
            runtime,
            &mut view_data,
            &internal_tx,
            vec![AppEvent::FetchRequested(request)],
        );
    }
    reload_drafts(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    if let Some(request) = state.pending_fetch() {
        let _ = runtime.cancel_listing_fetch(request);
    }
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearToast { token } if token == view_data.toast_token => {
                state.dispatch(AppCommand::ClearToast);
            }
            InternalEvent::ClearToast { .. } => {}
            InternalEvent::Listing { request, result } => {
                apply(
                    state,
                    runtime,
                    view_data,
                    tx,
                    AppCommand::ListingLoaded { request, result },
                );
            }
        }
    }
}

fn apply<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    handle_app_events(state, runtime, view_data, tx, events);
}

fn handle_app_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<AppEvent>,
) {
    for event in events {
        match event {
            AppEvent::FetchRequested(request) => {
                debug!(request, "listing fetch requested");
                if let Err(error) = runtime.spawn_listing_fetch(request, tx.clone()) {
                    apply(
                        state,
                        runtime,
                        view_data,
                        tx,
                        AppCommand::ListingLoaded {
                            request,
                            result: Err(format!("{error:#}")),
                        },
                    );
                }
            }
            AppEvent::FetchCancelled(request) => {
                debug!(request, "listing fetch cancelled");
                if let Err(error) = runtime.cancel_listing_fetch(request) {
                    warn!(request, error = %format!("{error:#}"), "cancel listing fetch");
                }
            }
            AppEvent::StaleListingIgnored(request) => {
                debug!(request, "stale listing result dropped");
            }
            AppEvent::ListingUpdated => {
                view_data.row_cursor = 0;
                if let Some(error) = state.listing.error() {
                    warn!(error, "invoice listing fetch failed");
                }
            }
            AppEvent::ViewChanged(view) => {
                view_data.focus = None;
                view_data.search_editing = false;
                view_data.row_cursor = 0;
                if view == View::Dashboard {
                    reload_drafts(state, runtime, view_data, tx);
                }
            }
            AppEvent::FilterChanged(_)
            | AppEvent::SearchChanged
            | AppEvent::ListingTabChanged(_)
            | AppEvent::PageChanged(_)
            | AppEvent::PageSizeChanged(_) => view_data.row_cursor = 0,
            AppEvent::ToastShown(_) => {
                view_data.toast_token = view_data.toast_token.saturating_add(1);
                schedule_toast_clear(tx, view_data.toast_token);
            }
            AppEvent::Rejected(reason) => {
                debug!(reason = %reason, "command rejected");
                apply(
                    state,
                    runtime,
                    view_data,
                    tx,
                    AppCommand::Notify(Notification::info(reason)),
                );
            }
            AppEvent::FormMounted(_)
            | AppEvent::FormUnmounted(_)
            | AppEvent::DraftsUpdated
            | AppEvent::FieldUpdated { .. }
            | AppEvent::FormChanged
            | AppEvent::ToastCleared => {}
        }
    }
}

fn schedule_toast_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(TOAST_DURATION);
        let _ = sender.send(InternalEvent::ClearToast { token });
    });
}

fn emit_toast<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    notification: Notification,
) {
    apply(
        state,
        runtime,
        view_data,
        tx,
        AppCommand::Notify(notification),
    );
}

fn reload_drafts<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    match runtime.load_drafts() {
        Ok(drafts) => {
            state.dispatch(AppCommand::DraftsLoaded(drafts));
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "load drafts");
            emit_toast(
                state,
                runtime,
                view_data,
                tx,
                Notification::error(format!("could not load drafts: {error:#}")),
            );
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.form.is_some() {
        handle_form_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.search_editing {
        handle_search_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    handle_dashboard_key(state, runtime, view_data, internal_tx, key)
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.search_editing = false;
            apply(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::SetSearch(String::new()),
            );
        }
        KeyCode::Enter => view_data.search_editing = false,
        KeyCode::Backspace => {
            let mut query = state.search.clone();
            query.pop();
            apply(state, runtime, view_data, tx, AppCommand::SetSearch(query));
        }
        KeyCode::Char(ch) if !has_command_modifier(key) => {
            let mut query = state.search.clone();
            query.push(ch);
            apply(state, runtime, view_data, tx, AppCommand::SetSearch(query));
        }
        _ => {}
    }
}

fn handle_dashboard_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let command = match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            return false;
        }
        KeyCode::Char('/') => {
            view_data.search_editing = true;
            return false;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            move_row_cursor(state, view_data, 1);
            return false;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            move_row_cursor(state, view_data, -1);
            return false;
        }
        KeyCode::Char('x') if state.listing_tab == ListingTab::Drafts => {
            delete_selected_draft(state, runtime, view_data, tx);
            return false;
        }
        KeyCode::Char('n') => AppCommand::Navigate(View::CreateInvoice),
        KeyCode::Char('N') => AppCommand::Navigate(View::RecurringInvoice),
        KeyCode::Tab => AppCommand::NextFilter,
        KeyCode::BackTab => AppCommand::PrevFilter,
        KeyCode::Char(digit @ '1'..='4') => {
            let index = usize::from(digit as u8 - b'1');
            AppCommand::SetFilter(StatusFilter::tabs()[index].clone())
        }
        KeyCode::Char('d') => AppCommand::ToggleListingTab,
        KeyCode::Char(']') | KeyCode::PageDown => AppCommand::NextPage,
        KeyCode::Char('[') | KeyCode::PageUp => AppCommand::PrevPage,
        KeyCode::Char('p') => AppCommand::CyclePageSize,
        KeyCode::Char('r') => AppCommand::RefreshListing,
        _ => return false,
    };
    apply(state, runtime, view_data, tx, command);
    false
}

fn visible_row_count(state: &AppState) -> usize {
    match state.listing_tab {
        ListingTab::Invoices => {
            let records = state.visible_records();
            paginate(&records, state.page_size, state.page).len()
        }
        ListingTab::Drafts => page_drafts(state).len(),
    }
}

fn move_row_cursor(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let rows = visible_row_count(state);
    if rows == 0 {
        view_data.row_cursor = 0;
        return;
    }
    let next = view_data.row_cursor as isize + delta;
    view_data.row_cursor = next.clamp(0, rows as isize - 1) as usize;
}

fn page_drafts(state: &AppState) -> &[SavedDraft] {
    let size = state.page_size.rows();
    let pages = page_count(state.drafts.len(), state.page_size);
    let page = state.page.min(pages - 1);
    let start = (page * size).min(state.drafts.len());
    let end = (start + size).min(state.drafts.len());
    &state.drafts[start..end]
}

fn delete_selected_draft<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let drafts = page_drafts(state);
    let Some(id) = drafts.get(view_data.row_cursor).map(|saved| saved.id) else {
        emit_toast(
            state,
            runtime,
            view_data,
            tx,
            Notification::info("no draft selected"),
        );
        return;
    };
    let notification = match runtime.delete_draft(id) {
        Ok(()) => Notification::success(format!("Draft {} deleted.", id.get())),
        Err(error) => Notification::error(format!("Draft delete failed: {error:#}")),
    };
    reload_drafts(state, runtime, view_data, tx);
    let rows = visible_row_count(state);
    view_data.row_cursor = view_data.row_cursor.min(rows.saturating_sub(1));
    emit_toast(state, runtime, view_data, tx, notification);
}

fn has_command_modifier(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) || key.modifiers.contains(KeyModifiers::ALT)
}

/// The control that has focus, falling back to the first text field when the
/// remembered one is gone (e.g. the end condition hid it).
fn focused_control(form: &FormState, view_data: &ViewData) -> FormControl {
    let controls = form.controls();
    view_data
        .focus
        .filter(|focus| controls.contains(focus))
        .or_else(|| {
            controls
                .iter()
                .copied()
                .find(|control| matches!(control, FormControl::Field(_)))
        })
        .unwrap_or(FormControl::Submit)
}

fn move_focus(form: &FormState, view_data: &mut ViewData, delta: isize) {
    let controls = form.controls();
    let current = focused_control(form, view_data);
    let index = controls
        .iter()
        .position(|control| *control == current)
        .unwrap_or(0) as isize;
    let next = (index + delta).rem_euclid(controls.len() as isize) as usize;
    view_data.focus = Some(controls[next]);
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(form) = state.form.as_ref() else {
        return;
    };
    let focus = focused_control(form, view_data);

    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        save_form_draft(state, runtime, view_data, tx);
        return;
    }

    match key.code {
        KeyCode::Esc => {
            apply(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::Navigate(View::Dashboard),
            );
            return;
        }
        KeyCode::Tab | KeyCode::Down => {
            move_focus(form, view_data, 1);
            return;
        }
        KeyCode::BackTab | KeyCode::Up => {
            move_focus(form, view_data, -1);
            return;
        }
        _ => {}
    }

    let activate = matches!(key.code, KeyCode::Enter | KeyCode::Char(' '));
    match focus {
        FormControl::Field(field) => {
            let mut raw = form.value(field).to_owned();
            match key.code {
                KeyCode::Enter => {
                    move_focus(form, view_data, 1);
                    return;
                }
                KeyCode::Backspace => {
                    raw.pop();
                }
                KeyCode::Char(ch) if !has_command_modifier(key) => raw.push(ch),
                _ => return,
            }
            apply(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::UpdateField(field, raw),
            );
        }
        FormControl::Language if activate || matches!(key.code, KeyCode::Left | KeyCode::Right) => {
            apply(state, runtime, view_data, tx, AppCommand::ToggleLanguage);
        }
        FormControl::Channel(channel) if activate => {
            apply(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::ToggleChannel(channel),
            );
        }
        FormControl::Frequency if activate || key.code == KeyCode::Right => {
            apply(state, runtime, view_data, tx, AppCommand::CycleFrequency);
        }
        FormControl::EndCondition if activate || key.code == KeyCode::Right => {
            apply(state, runtime, view_data, tx, AppCommand::CycleEndCondition);
            view_data.focus = Some(FormControl::EndCondition);
        }
        FormControl::SaveDraft if activate => save_form_draft(state, runtime, view_data, tx),
        FormControl::Submit if activate => submit_form(state, runtime, view_data, tx),
        _ => {}
    }
}

fn save_form_draft<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let events = {
        let (store, _) = runtime.collaborators();
        state.save_draft(store)
    };
    handle_app_events(state, runtime, view_data, tx, events);
    reload_drafts(state, runtime, view_data, tx);
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let (submission, events) = {
        let (store, sender) = runtime.collaborators();
        state.submit(store, sender)
    };
    handle_app_events(state, runtime, view_data, tx, events);
    if matches!(submission, Some(Submission::SavedDraft(_))) {
        reload_drafts(state, runtime, view_data, tx);
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = View::ALL
        .iter()
        .position(|view| *view == state.view)
        .unwrap_or(0);
    let titles: Vec<&str> = View::ALL.iter().map(|view| view.label()).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().title("fatoora").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.form.as_ref() {
        Some(form) => {
            let focus = focused_control(form, view_data);
            let body = Paragraph::new(form_lines(form, focus))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(form_heading(form.kind())),
                );
            frame.render_widget(body, layout[1]);
        }
        None => render_dashboard(frame, layout[1], state, view_data),
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[2]);

    if view_data.help_visible {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }

    if let Some(toast) = state.toast.as_ref() {
        let area = toast_rect(frame.area(), &toast.message);
        frame.render_widget(Clear, area);
        let widget = Paragraph::new(toast.message.clone())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(toast_color(toast.level)))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(widget, area);
    }
}

fn render_dashboard(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(overview_text(state.listing.records())),
        sections[0],
    );

    let filter_index = StatusFilter::tabs()
        .iter()
        .position(|tab| *tab == state.filter)
        .unwrap_or(0);
    let filters = Tabs::new(
        StatusFilter::tabs()
            .iter()
            .map(|tab| tab.label().to_owned())
            .collect::<Vec<_>>(),
    )
    .highlight_style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .select(filter_index);
    frame.render_widget(filters, sections[1]);

    frame.render_widget(Paragraph::new(search_text(state, view_data)), sections[2]);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(listing_title(state));
    match (state.listing_tab, listing_notice(state)) {
        (ListingTab::Invoices, Some(notice)) if state.listing.records().is_empty() => {
            frame.render_widget(Paragraph::new(notice).block(block), sections[3]);
        }
        (ListingTab::Invoices, notice) => {
            let records = state.visible_records();
            let page = paginate(&records, state.page_size, state.page);
            let rows = page
                .iter()
                .enumerate()
                .map(|(index, record)| invoice_row(record, index == view_data.row_cursor));
            let table = Table::new(rows, invoice_widths())
                .header(header_row(&INVOICE_COLUMNS))
                .block(block);
            frame.render_widget(table, sections[3]);
            if let Some(notice) = notice {
                let line = Rect {
                    y: sections[3].bottom().saturating_sub(2),
                    height: 1,
                    x: sections[3].x + 1,
                    width: sections[3].width.saturating_sub(2),
                };
                frame.render_widget(
                    Paragraph::new(notice).style(Style::default().fg(Color::Red)),
                    line,
                );
            }
        }
        (ListingTab::Drafts, _) => {
            let rows = page_drafts(state)
                .iter()
                .enumerate()
                .map(|(index, saved)| draft_row(saved, index == view_data.row_cursor));
            let table = Table::new(rows, draft_widths())
                .header(header_row(&DRAFT_COLUMNS))
                .block(block);
            frame.render_widget(table, sections[3]);
        }
    }

    frame.render_widget(
        Paragraph::new(pagination_text(state)).style(Style::default().fg(Color::DarkGray)),
        sections[4],
    );
}

fn overview_text(records: &[InvoiceRecord]) -> String {
    let counts = status_counts(records);
    format!(
        "invoices {} | awaiting payment {} | overdue {} | paid {} | draft {}",
        counts.total, counts.awaiting_payment, counts.overdue, counts.paid, counts.draft
    )
}

fn search_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.search_editing {
        format!("search: {}_", state.search)
    } else if state.search.is_empty() {
        "search: / Search Invoice# or client name".to_owned()
    } else {
        format!("search: {}", state.search)
    }
}

fn listing_title(state: &AppState) -> String {
    match state.listing_tab {
        ListingTab::Invoices => format!("[Invoices] Drafts ({})", state.drafts.len()),
        ListingTab::Drafts => format!("Invoices [Drafts ({})]", state.drafts.len()),
    }
}

fn listing_notice(state: &AppState) -> Option<String> {
    if state.listing.is_loading() {
        return Some("loading invoices...".to_owned());
    }
    state
        .listing
        .error()
        .map(|error| format!("could not load invoices: {error} -- press r to retry"))
}

fn pagination_text(state: &AppState) -> String {
    let total = match state.listing_tab {
        ListingTab::Invoices => state.visible_records().len(),
        ListingTab::Drafts => state.drafts.len(),
    };
    let pages = page_count(total, state.page_size);
    format!(
        "page {}/{} | {} per page | {} rows",
        state.page.min(pages - 1) + 1,
        pages,
        state.page_size.rows(),
        total
    )
}

fn header_row(columns: &[&'static str]) -> Row<'static> {
    Row::new(columns.iter().map(|column| Cell::from(*column)))
        .style(Style::default().add_modifier(Modifier::BOLD))
}

fn invoice_widths() -> [Constraint; 7] {
    [
        Constraint::Length(9),
        Constraint::Length(12),
        Constraint::Min(12),
        Constraint::Length(14),
        Constraint::Length(17),
        Constraint::Length(13),
        Constraint::Min(10),
    ]
}

fn draft_widths() -> [Constraint; 6] {
    [
        Constraint::Length(7),
        Constraint::Length(17),
        Constraint::Length(10),
        Constraint::Min(12),
        Constraint::Length(14),
        Constraint::Length(13),
    ]
}

fn invoice_row(record: &InvoiceRecord, selected: bool) -> Row<'static> {
    let status = Cell::from(record.status.as_str().to_owned())
        .style(Style::default().fg(badge_color(record.status.badge())));
    let row = Row::new(vec![
        Cell::from(record.id.clone()),
        Cell::from(record.display_date().to_owned()),
        Cell::from(record.customer.clone()),
        Cell::from(record.phone.clone()),
        status,
        Cell::from(format_amount(&record.amount)),
        Cell::from(record.remarks.clone()),
    ]);
    if selected {
        row.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        row
    }
}

fn draft_row(saved: &SavedDraft, selected: bool) -> Row<'static> {
    let draft = &saved.draft;
    let kind = match draft.kind {
        FormKind::OneOff => "one-off",
        FormKind::Recurring => "recurring",
    };
    let saved_at = format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        saved.created_at.year(),
        u8::from(saved.created_at.month()),
        saved.created_at.day(),
        saved.created_at.hour(),
        saved.created_at.minute()
    );
    let row = Row::new(vec![
        Cell::from(saved.id.get().to_string()),
        Cell::from(saved_at),
        Cell::from(kind),
        Cell::from(draft.customer_name.clone()),
        Cell::from(draft.phone()),
        Cell::from(format_amount(&draft.amount)),
    ]);
    if selected {
        row.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        row
    }
}

fn format_amount(amount: &str) -> String {
    if amount.trim().is_empty() {
        String::new()
    } else {
        format!("{} {}", fatoora_app::CURRENCY, amount.trim())
    }
}

const fn badge_color(badge: StatusBadge) -> Color {
    match badge {
        StatusBadge::Success => Color::Green,
        StatusBadge::Danger => Color::Red,
        StatusBadge::Warning => Color::Yellow,
    }
}

const fn toast_color(level: NotificationLevel) -> Color {
    match level {
        NotificationLevel::Success => Color::Green,
        NotificationLevel::Error => Color::Red,
        NotificationLevel::Info => Color::Cyan,
    }
}

fn form_heading(kind: FormKind) -> &'static str {
    match kind {
        FormKind::OneOff => "Create Invoice",
        FormKind::Recurring => "Create Recurring Invoice",
    }
}

fn focus_prefix(focused: bool) -> Span<'static> {
    if focused {
        Span::styled(
            format!("{FOCUS_MARK} "),
            Style::default().fg(Color::Cyan),
        )
    } else {
        Span::raw("  ")
    }
}

fn label_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn field_prefix(field: FieldName) -> String {
    match field {
        FieldName::Mobile => format!("{} ", fatoora_app::COUNTRY_CODE),
        _ => String::new(),
    }
}

fn form_lines(form: &FormState, focus: FormControl) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for control in form.controls() {
        let focused = control == focus;
        match control {
            FormControl::Language => {
                let mark = |selected: bool| if selected { "(•)" } else { "( )" };
                lines.push(Line::from(vec![
                    focus_prefix(focused),
                    Span::styled("Choose Language: ", label_style(focused)),
                    Span::raw(format!(
                        "{} English  {} Arabic",
                        mark(form.language == fatoora_app::Language::English),
                        mark(form.language == fatoora_app::Language::Arabic),
                    )),
                ]));
                lines.push(Line::default());
            }
            FormControl::Field(field) => {
                let required = form.kind().validator_for(field).is_some();
                let label = format!(
                    "{}{}: ",
                    field.label(),
                    if required { " *" } else { "" }
                );
                let value = form.value(field);
                let shown = if value.is_empty() {
                    Span::styled(
                        field.placeholder().to_owned(),
                        Style::default().fg(Color::DarkGray),
                    )
                } else {
                    Span::raw(value.to_owned())
                };
                let mut spans = vec![
                    focus_prefix(focused),
                    Span::styled(label, label_style(focused)),
                    Span::raw(field_prefix(field)),
                    shown,
                ];
                if focused {
                    spans.push(Span::styled("_", Style::default().fg(Color::Cyan)));
                }
                lines.push(Line::from(spans));
                let error = form.error(field);
                if !error.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("    {error}"),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
            FormControl::Frequency => {
                let label = form
                    .frequency()
                    .map_or("Select Frequency", |frequency| frequency.label());
                lines.push(Line::from(vec![
                    focus_prefix(focused),
                    Span::styled("Frequency: ", label_style(focused)),
                    Span::raw(format!("< {label} >")),
                ]));
            }
            FormControl::EndCondition => {
                lines.push(Line::from(vec![
                    focus_prefix(focused),
                    Span::styled("Ending *: ", label_style(focused)),
                    Span::raw(format!("< {} >", form.end_condition().label())),
                ]));
            }
            FormControl::Channel(channel) => {
                if channel == Channel::ALL[0] {
                    lines.push(Line::default());
                    lines.push(Line::from("  Send Invoice Via:"));
                }
                let mark = if form.send_via.contains(channel) {
                    "[x]"
                } else {
                    "[ ]"
                };
                lines.push(Line::from(vec![
                    focus_prefix(focused),
                    Span::styled(format!("{mark} {}", channel.label()), label_style(focused)),
                ]));
            }
            FormControl::SaveDraft => {
                lines.push(Line::default());
                lines.push(Line::from(vec![
                    focus_prefix(focused),
                    Span::styled("[ Save Draft ]", label_style(focused)),
                ]));
            }
            FormControl::Submit => {
                let enabled = form.is_valid();
                let style = if !enabled {
                    Style::default().fg(Color::DarkGray)
                } else {
                    label_style(focused)
                };
                let text = if enabled {
                    "[ Send Invoice ]"
                } else {
                    "[ Send Invoice ] (disabled)"
                };
                lines.push(Line::from(vec![
                    focus_prefix(focused),
                    Span::styled(text, style),
                ]));
            }
        }
    }
    lines
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return "esc/? close help".to_owned();
    }
    match state.form.as_ref() {
        Some(form) => {
            let focus = focused_control(form, view_data);
            let hint = match focus {
                FormControl::Field(_) => "type to edit",
                FormControl::SaveDraft | FormControl::Submit => "enter press",
                _ => "space toggle",
            };
            format!("FORM | tab/shift+tab move | {hint} | ctrl+s save draft | esc back | ctrl+q")
        }
        None if view_data.search_editing => SEARCH_HINT.to_owned(),
        None => DASHBOARD_HINT.to_owned(),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
dashboard: n new invoice | N new recurring invoice | j/k rows\n\
dashboard: tab/shift+tab or 1-4 status filter | / search | d invoices/drafts\n\
dashboard: ]/[ or pgdn/pgup page | p page size | r refresh listing | x delete draft\n\
form: tab/shift+tab or up/down move | type to edit | space/enter toggle or press\n\
form: ctrl+s save draft | esc back to dashboard"
}

/// Top-right box sized to the message, clipped to the frame.
fn toast_rect(area: Rect, message: &str) -> Rect {
    let text_width = u16::try_from(message.chars().count()).unwrap_or(u16::MAX);
    let width = text_width.saturating_add(4).clamp(24, 48).min(area.width);
    let inner = width.saturating_sub(2).max(1);
    let lines = text_width.div_ceil(inner).max(1);
    let height = lines.saturating_add(2).min(area.height);
    let top = area.y.saturating_add(1);
    Rect {
        x: area.right().saturating_sub(width + 1).max(area.x),
        y: top.min(area.bottom().saturating_sub(height)),
        width,
        height,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
