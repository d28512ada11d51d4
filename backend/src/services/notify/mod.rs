//! Outbound email notifications via the Resend HTTP API.
//!
//! Every send is best-effort: a missing API key, a request without a student
//! email or a non-success API status is logged with `warn!` and the workflow
//! continues. No delivery state is persisted.

use crate::config::Config;
use common::model::letter_request::LetterRequestDetail;
use common::model::status::RequestStatus;
use log::{info, warn};
use serde_json::json;

const RESEND_URL: &str = "https://api.resend.com/emails";
const FROM_ADDRESS: &str = "SURATKU <noreply@suratku.example>";

/// Sends one HTML email through Resend. Returns the API failure as a plain
/// string; callers decide whether to log or ignore it.
pub async fn send_email(
    cfg: &Config,
    to: &str,
    subject: &str,
    html: &str,
) -> Result<(), String> {
    let api_key = match &cfg.resend_api_key {
        Some(key) => key,
        None => {
            info!("RESEND_API_KEY not set, skipping email to {}", to);
            return Ok(());
        }
    };

    let client = reqwest::Client::new();
    let response = client
        .post(RESEND_URL)
        .bearer_auth(api_key)
        .json(&json!({
            "from": FROM_ADDRESS,
            "to": [to],
            "subject": subject,
            "html": html,
        }))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("resend returned {}: {}", status, body));
    }
    Ok(())
}

/// Emails the student about a status transition. Only `Approved`,
/// `Processing` and `Completed` notify; a correction back to `Submitted`
/// stays silent.
pub async fn status_changed(cfg: &Config, detail: &LetterRequestDetail) {
    let (subject, message) = match status_message(detail.request.status) {
        Some(parts) => parts,
        None => return,
    };

    let student = match &detail.student {
        Some(student) if !student.email.trim().is_empty() => student,
        _ => {
            warn!(
                "request {} has no student email, skipping notification",
                detail.request.reference
            );
            return;
        }
    };

    let letter_name = detail
        .letter_type
        .as_ref()
        .map(|t| t.name.as_str())
        .unwrap_or("surat");
    let subject = format!("[SURATKU] {} - {}", subject, detail.request.reference);
    let html = format!(
        "<p>Halo {},</p>\
         <p>Pengajuan {} Anda dengan nomor <b>{}</b> {}</p>\
         <p>Pantau statusnya di <a href=\"{}/track\">halaman pelacakan</a> \
         menggunakan nomor pengajuan Anda.</p>\
         <p>Terima kasih.</p>",
        student.name, letter_name, detail.request.reference, message, cfg.site_url
    );

    match send_email(cfg, &student.email, &subject, &html).await {
        Ok(()) => info!(
            "status email for {} sent to {}",
            detail.request.reference, student.email
        ),
        Err(e) => warn!(
            "status email for {} not sent: {}",
            detail.request.reference, e
        ),
    }
}

fn status_message(status: RequestStatus) -> Option<(&'static str, &'static str)> {
    match status {
        RequestStatus::Submitted => None,
        RequestStatus::Approved => Some((
            "Pengajuan Disetujui",
            "telah disetujui dan akan segera diproses.",
        )),
        RequestStatus::Processing => Some((
            "Pengajuan Sedang Diproses",
            "sedang diproses oleh admin.",
        )),
        RequestStatus::Completed => Some((
            "Surat Selesai",
            "telah selesai dan siap diunduh melalui halaman pelacakan.",
        )),
    }
}
