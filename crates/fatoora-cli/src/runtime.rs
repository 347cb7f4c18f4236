// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use fatoora_app::{
    DraftId, DraftStore, InvoiceDraft, InvoiceRecord, InvoiceSender, RequestId, SavedDraft,
    SendChannels,
};
use fatoora_db::Store;
use fatoora_testkit::InvoiceFaker;
use fatoora_tui::InternalEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

pub const DEMO_SEED: u64 = 973;
pub const DEMO_INVOICE_COUNT: usize = 64;

/// Where listing rows come from and where sends go.
#[derive(Debug, Clone)]
pub enum Backend {
    Remote(fatoora_api::Client),
    Demo(DemoBackend),
}

/// Offline stand-in for the invoice server: a seeded listing and a send
/// gateway that accepts everything.
#[derive(Debug, Clone)]
pub struct DemoBackend {
    seed: u64,
    count: usize,
    latency: Duration,
}

impl DemoBackend {
    pub fn new(seed: u64, count: usize, latency: Duration) -> Self {
        Self {
            seed,
            count,
            latency,
        }
    }
}

impl Backend {
    pub fn fetch_invoices(&self) -> Result<Vec<InvoiceRecord>> {
        match self {
            Self::Remote(client) => client.fetch_invoices(),
            Self::Demo(demo) => {
                thread::sleep(demo.latency);
                Ok(InvoiceFaker::new(demo.seed).invoices(demo.count))
            }
        }
    }
}

impl InvoiceSender for Backend {
    fn send(&mut self, draft: &InvoiceDraft, channels: SendChannels) -> Result<()> {
        match self {
            Self::Remote(client) => client.send_invoice(draft, channels),
            Self::Demo(_) => {
                if !channels.any() {
                    return Err(anyhow!("no delivery channel selected"));
                }
                info!(channels = %channels.describe(), "demo send accepted");
                Ok(())
            }
        }
    }
}

pub struct CliRuntime<'a> {
    store: &'a mut Store,
    backend: Backend,
    inflight: Option<(RequestId, Arc<AtomicBool>)>,
}

impl<'a> CliRuntime<'a> {
    pub fn new(store: &'a mut Store, backend: Backend) -> Self {
        Self {
            store,
            backend,
            inflight: None,
        }
    }
}

impl fatoora_tui::AppRuntime for CliRuntime<'_> {
    fn fetch_invoices(&mut self) -> Result<Vec<InvoiceRecord>> {
        self.backend.fetch_invoices()
    }

    fn load_drafts(&mut self) -> Result<Vec<SavedDraft>> {
        self.store.list_drafts()
    }

    fn delete_draft(&mut self, id: DraftId) -> Result<()> {
        self.store.delete_draft(id)
    }

    fn collaborators(&mut self) -> (&mut dyn DraftStore, &mut dyn InvoiceSender) {
        (&mut *self.store, &mut self.backend)
    }

    fn spawn_listing_fetch(&mut self, request: RequestId, tx: Sender<InternalEvent>) -> Result<()> {
        if let Some((previous, cancelled)) = self.inflight.take() {
            debug!(request = previous, "superseding listing fetch");
            cancelled.store(true, Ordering::SeqCst);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let backend = self.backend.clone();
        thread::Builder::new()
            .name(format!("listing-fetch-{request}"))
            .spawn(move || {
                let result = backend
                    .fetch_invoices()
                    .map_err(|error| format!("{error:#}"));
                if flag.load(Ordering::SeqCst) {
                    debug!(request, "listing fetch finished after cancel");
                    return;
                }
                let _ = tx.send(InternalEvent::Listing { request, result });
            })
            .map_err(|error| anyhow!("spawn listing fetch thread: {error}"))?;

        self.inflight = Some((request, cancelled));
        Ok(())
    }

    fn cancel_listing_fetch(&mut self, request: RequestId) -> Result<()> {
        match self.inflight.take() {
            Some((current, cancelled)) if current == request => {
                cancelled.store(true, Ordering::SeqCst);
            }
            other => self.inflight = other,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Backend, CliRuntime, DemoBackend};
    use anyhow::Result;
    use fatoora_app::{Channel, FieldName, FormKind, FormState, InvoiceSender};
    use fatoora_db::Store;
    use fatoora_testkit::InvoiceFaker;
    use fatoora_tui::{AppRuntime, InternalEvent};
    use std::sync::mpsc;
    use std::time::Duration;

    fn demo(latency: Duration) -> Backend {
        Backend::Demo(DemoBackend::new(5, 12, latency))
    }

    fn memory_store() -> Result<Store> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        Ok(store)
    }

    #[test]
    fn background_fetch_delivers_tagged_listing() -> Result<()> {
        let mut store = memory_store()?;
        let mut runtime = CliRuntime::new(&mut store, demo(Duration::ZERO));
        let (tx, rx) = mpsc::channel();

        runtime.spawn_listing_fetch(7, tx)?;
        let event = rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(
            event,
            InternalEvent::Listing {
                request: 7,
                result: Ok(InvoiceFaker::new(5).invoices(12)),
            }
        );
        Ok(())
    }

    #[test]
    fn cancelled_fetch_never_reports() -> Result<()> {
        let mut store = memory_store()?;
        let mut runtime = CliRuntime::new(&mut store, demo(Duration::from_millis(150)));
        let (tx, rx) = mpsc::channel();

        runtime.spawn_listing_fetch(1, tx)?;
        runtime.cancel_listing_fetch(1)?;
        assert!(rx.recv_timeout(Duration::from_millis(600)).is_err());
        Ok(())
    }

    #[test]
    fn cancelling_another_request_keeps_current_one() -> Result<()> {
        let mut store = memory_store()?;
        let mut runtime = CliRuntime::new(&mut store, demo(Duration::from_millis(50)));
        let (tx, rx) = mpsc::channel();

        runtime.spawn_listing_fetch(2, tx)?;
        runtime.cancel_listing_fetch(1)?;
        let event = rx.recv_timeout(Duration::from_secs(5))?;
        assert!(matches!(event, InternalEvent::Listing { request: 2, .. }));
        Ok(())
    }

    #[test]
    fn drafts_flow_through_store() -> Result<()> {
        let mut store = memory_store()?;
        let mut runtime = CliRuntime::new(&mut store, demo(Duration::ZERO));

        let mut form = FormState::new(FormKind::OneOff);
        form.update_field(FieldName::Notes, "quarterly")?;
        let id = {
            let (drafts, _) = runtime.collaborators();
            drafts.save_draft(&form.to_draft())?
        };

        let listed = runtime.load_drafts()?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);

        runtime.delete_draft(id)?;
        assert!(runtime.load_drafts()?.is_empty());
        assert!(runtime.delete_draft(id).is_err());
        Ok(())
    }

    #[test]
    fn demo_sender_requires_a_channel() -> Result<()> {
        let mut backend = demo(Duration::ZERO);
        let mut form = FormState::new(FormKind::OneOff);
        assert!(backend.send(&form.to_draft(), form.send_via).is_err());

        form.set_channel(Channel::Email, true);
        backend.send(&form.to_draft(), form.send_via)?;
        Ok(())
    }

    #[test]
    fn remote_backend_reports_unreachable_server() -> Result<()> {
        let client = fatoora_api::Client::new("http://127.0.0.1:1", Duration::from_millis(50))?;
        let backend = Backend::Remote(client);
        let error = backend
            .fetch_invoices()
            .expect_err("nothing listens on port 1");
        assert!(error.to_string().contains("api.base_url"));
        Ok(())
    }
}
