// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use fatoora_api::Client;
use fatoora_app::{Channel, FieldName, FormKind, FormState, InvoiceSender, InvoiceStatus};
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn fetch_error_contains_actionable_remediation() {
    let client =
        Client::new("http://127.0.0.1:1", Duration::from_millis(50)).expect("client should build");

    let error = client
        .fetch_invoices()
        .expect_err("fetch should fail for unreachable endpoint");
    assert!(error.to_string().contains("api.base_url"));
}

#[test]
fn fetch_invoices_decodes_listing_envelope() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url(), "/api/invoiceListingss");
        let body = r#"{"invoiceObj":[
            {"id":1001,"formattedDate":"02 Feb 2026","customer":"Layla","phone":"36112233","status":"Paid","amount":"12.500","remarks":"rent"},
            {"id":"1002","date":"03 Feb 2026","customer":"Omar","phone":"39001122","status":"Awaiting Payment","amount":7,"remarks":""},
            {"id":1003,"customer":"Noor","status":"Cancelled"}
        ]}"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(2))?;
    let invoices = client.fetch_invoices()?;
    assert_eq!(invoices.len(), 3);
    assert_eq!(invoices[0].id, "1001");
    assert_eq!(invoices[0].display_date(), "02 Feb 2026");
    assert_eq!(invoices[1].status, InvoiceStatus::AwaitingPayment);
    assert_eq!(invoices[1].amount, "7");
    assert_eq!(
        invoices[2].status,
        InvoiceStatus::Other("Cancelled".to_owned())
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn listing_requires_the_invoice_envelope() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        for body in [r#"{"error":"wrong endpoint"}"#, r#"{"invoiceObj":[]}"#] {
            let request = server.recv().expect("request expected");
            request
                .respond(json_response(body, 200))
                .expect("response should succeed");
        }
    });

    let client = Client::new(&addr, Duration::from_secs(2))?;
    let error = client
        .fetch_invoices()
        .expect_err("missing invoiceObj should fail");
    assert!(format!("{error:#}").contains("invoiceObj"), "{error:#}");
    assert!(client.fetch_invoices()?.is_empty());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fetch_surfaces_server_errors() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"error":"database offline"}"#, 503))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(2))?;
    let error = client.fetch_invoices().expect_err("503 should fail");
    assert_eq!(error.to_string(), "server error (503): database offline");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn send_posts_draft_and_selected_channels() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/gateway/send");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("body should read");
        let payload: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(payload["channels"], serde_json::json!(["sms", "whatsapp"]));
        assert_eq!(payload["invoice"]["mobile"], "36112233");
        assert_eq!(payload["invoice"]["currency"], "BHD");
        assert_eq!(payload["invoice"]["country_code"], "+973");
        request
            .respond(json_response(r#"{"ok":true}"#, 202))
            .expect("response should succeed");
    });

    let mut form = FormState::new(FormKind::OneOff);
    form.update_field(FieldName::Mobile, "36112233")?;
    form.update_field(FieldName::Email, "a@b.com")?;
    form.set_channel(Channel::Sms, true);
    form.set_channel(Channel::Whatsapp, true);

    let mut client = Client::new(&addr, Duration::from_secs(2))?.with_send_path("/gateway/send")?;
    client.send(&form.to_draft(), form.send_via)?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn send_without_channels_is_refused_locally() {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50)).expect("client");
    let form = FormState::new(FormKind::OneOff);
    let error = client
        .send_invoice(&form.to_draft(), form.send_via)
        .expect_err("no channel selected");
    assert!(error.to_string().contains("no delivery channel"));
}
