//! Letter PDF rendering.
//!
//! A letter type may carry a free-text template with `{{token}}`
//! placeholders; when present the PDF is built from the substituted
//! template lines, otherwise a fixed default layout is used. Both variants
//! share the letterhead block and the signature block.

use crate::config::Config;
use crate::error::ServiceError;
use chrono::{Datelike, Utc};
use common::model::letter_request::LetterRequestDetail;
use common::model::letterhead::Letterhead;
use genpdf::elements::{Break, Paragraph};
use genpdf::style::Style;
use genpdf::{Alignment, Document, Element};
use std::collections::HashMap;

const INDONESIAN_MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Which body the renderer uses for a request.
pub enum LetterLayout {
    /// The letter type's own template, already token-substituted.
    Templated(String),
    /// The built-in layout used when the type has no template.
    Default,
}

/// Picks the layout for a request: a non-empty type template wins.
pub fn layout_for(detail: &LetterRequestDetail) -> LetterLayout {
    let template = detail
        .letter_type
        .as_ref()
        .and_then(|t| t.template.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    match template {
        Some(template) => LetterLayout::Templated(substitute(template, &token_values(detail))),
        None => LetterLayout::Default,
    }
}

/// Replaces every known `{{token}}` with its value. Unknown tokens are left
/// in place so a typo shows up verbatim in the output; text without tokens
/// passes through unchanged.
pub fn substitute(template: &str, values: &HashMap<&'static str, String>) -> String {
    let mut out = template.to_string();
    for (token, value) in values {
        out = out.replace(&format!("{{{{{}}}}}", token), value);
    }
    out
}

/// The token vocabulary offered to template authors. Fields missing from
/// the joined rows yield a dash instead of an empty string.
pub fn token_values(detail: &LetterRequestDetail) -> HashMap<&'static str, String> {
    let mut values: HashMap<&'static str, String> = HashMap::new();
    for token in [
        "nama",
        "nim",
        "program_studi",
        "email",
        "no_hp",
        "jenis_surat",
        "tujuan_surat",
    ] {
        values.insert(token, "-".to_string());
    }
    if let Some(student) = &detail.student {
        values.insert("nama", student.name.clone());
        values.insert("nim", student.nim.clone());
        values.insert("program_studi", student.program.clone());
        values.insert("email", student.email.clone());
        values.insert("no_hp", student.phone.clone());
    }
    if let Some(letter_type) = &detail.letter_type {
        values.insert("jenis_surat", letter_type.name.clone());
        if let Some(addressee) = letter_type.addressee.clone().filter(|a| !a.trim().is_empty()) {
            values.insert("tujuan_surat", addressee);
        }
    }
    values.insert("keperluan", detail.request.purpose.clone());
    values.insert("tanggal", indonesian_date());
    values.insert("nomor_pengajuan", detail.request.reference.clone());
    values
}

/// Today as `30 Agustus 2026`.
pub fn indonesian_date() -> String {
    let today = Utc::now().date_naive();
    format!(
        "{} {} {}",
        today.day(),
        INDONESIAN_MONTHS[today.month0() as usize],
        today.year()
    )
}

/// Renders the letter for `detail` into PDF bytes.
pub fn render_letter(cfg: &Config, detail: &LetterRequestDetail) -> Result<Vec<u8>, ServiceError> {
    let letterhead = Letterhead::default();
    let mut doc = configure_document(cfg, detail)?;

    push_letterhead(&mut doc, &letterhead);

    let layout = layout_for(detail);
    let is_default = matches!(&layout, LetterLayout::Default);
    match layout {
        LetterLayout::Templated(body) => {
            for line in body.lines() {
                if line.is_empty() {
                    doc.push(Break::new(1));
                } else {
                    doc.push(Paragraph::new(line));
                }
            }
        }
        LetterLayout::Default => push_default_body(&mut doc, detail, &letterhead),
    }

    push_signature(&mut doc, &letterhead);
    if is_default {
        push_footer(&mut doc);
    }

    let mut bytes = Vec::new();
    doc.render(&mut bytes)
        .map_err(|e| ServiceError::Internal(format!("PDF rendering failed: {}", e)))?;
    Ok(bytes)
}

/// Loads the font family. The Arial TTFs take precedence when present;
/// LiberationSans in the same directory is the fallback.
fn load_font(cfg: &Config) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, ServiceError> {
    if let Ok(family) = genpdf::fonts::from_files(&cfg.fonts_dir, "Arial", None) {
        return Ok(family);
    }
    genpdf::fonts::from_files(&cfg.fonts_dir, "LiberationSans", None)
        .map_err(|e| ServiceError::Internal(format!("font loading failed: {}", e)))
}

fn configure_document(cfg: &Config, detail: &LetterRequestDetail) -> Result<Document, ServiceError> {
    let font_family = load_font(cfg)?;
    let mut doc = Document::new(font_family);
    doc.set_title(detail.request.reference.clone());
    doc.set_font_size(11);
    doc.set_line_spacing(1.2);

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(20);
    doc.set_page_decorator(decorator);
    Ok(doc)
}

fn push_letterhead(doc: &mut Document, letterhead: &Letterhead) {
    doc.push(
        Paragraph::new(letterhead.institution_name.clone())
            .aligned(Alignment::Center)
            .styled(Style::new().bold().with_font_size(14)),
    );
    doc.push(Paragraph::new(letterhead.institution_address.clone()).aligned(Alignment::Center));
    doc.push(
        Paragraph::new(format!(
            "Telp. {} | Email: {}",
            letterhead.institution_phone, letterhead.institution_email
        ))
        .aligned(Alignment::Center),
    );
    doc.push(Paragraph::new("=".repeat(80)).aligned(Alignment::Center));
    doc.push(Break::new(1));
}

fn push_default_body(doc: &mut Document, detail: &LetterRequestDetail, letterhead: &Letterhead) {
    let letter_name = detail
        .letter_type
        .as_ref()
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "SURAT KETERANGAN".to_string());

    if let Some(addressee) = detail
        .letter_type
        .as_ref()
        .and_then(|t| t.addressee.as_deref())
        .filter(|a| !a.trim().is_empty())
    {
        doc.push(Paragraph::new(format!("Kepada Yth. {}", addressee)));
        doc.push(Break::new(1));
    }

    doc.push(
        Paragraph::new(letter_name.to_uppercase())
            .aligned(Alignment::Center)
            .styled(Style::new().bold().with_font_size(12)),
    );
    doc.push(
        Paragraph::new(format!("Nomor: {}", detail.request.reference))
            .aligned(Alignment::Center),
    );
    doc.push(Break::new(1));

    doc.push(Paragraph::new(
        "Yang bertanda tangan di bawah ini menerangkan bahwa:",
    ));
    doc.push(Break::new(1));
    let values = token_values(detail);
    let field = |token: &str| values.get(token).cloned().unwrap_or_else(|| "-".to_string());
    push_label_value(doc, "Nama", &field("nama"));
    push_label_value(doc, "NIM", &field("nim"));
    push_label_value(doc, "Program Studi", &field("program_studi"));
    push_label_value(doc, "Email", &field("email"));
    push_label_value(doc, "No. HP", &field("no_hp"));
    doc.push(Break::new(1));

    doc.push(Paragraph::new(format!(
        "adalah benar mahasiswa aktif pada {}. Surat ini diterbitkan untuk keperluan: {}.",
        letterhead.institution_name, detail.request.purpose
    )));
    doc.push(Break::new(1));
    doc.push(Paragraph::new(
        "Demikian surat ini dibuat untuk dipergunakan sebagaimana mestinya.",
    ));
    doc.push(Break::new(1));
}

fn push_label_value(doc: &mut Document, label: &str, value: &str) {
    doc.push(Paragraph::new(format!("{:<16}: {}", label, value)));
}

fn push_signature(doc: &mut Document, letterhead: &Letterhead) {
    doc.push(
        Paragraph::new(format!("{}, {}", letterhead.institution_city, indonesian_date()))
            .aligned(Alignment::Right),
    );
    doc.push(Paragraph::new(letterhead.signer_title.clone()).aligned(Alignment::Right));
    doc.push(Break::new(3));
    doc.push(
        Paragraph::new(letterhead.signer_name.clone())
            .aligned(Alignment::Right)
            .styled(Style::new().bold()),
    );
    doc.push(Paragraph::new(format!("NIP. {}", letterhead.signer_nip)).aligned(Alignment::Right));
}

fn push_footer(doc: &mut Document) {
    doc.push(Break::new(2));
    let footer_style = Style::new().italic().with_font_size(8);
    doc.push(
        Paragraph::new(format!(
            "Dicetak pada {}",
            Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        ))
        .styled(footer_style),
    );
    doc.push(
        Paragraph::new("Dokumen ini diterbitkan secara elektronik dan sah tanpa tanda tangan basah.")
            .aligned(Alignment::Right)
            .styled(footer_style),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::letter_request::LetterRequest;
    use common::model::letter_type::LetterType;
    use common::model::status::RequestStatus;
    use common::model::student::Student;

    fn sample_detail(template: Option<&str>) -> LetterRequestDetail {
        LetterRequestDetail {
            request: LetterRequest {
                id: "r1".to_string(),
                reference: "SUK-202501-0001".to_string(),
                student_id: "s1".to_string(),
                letter_type_id: "t1".to_string(),
                purpose: "pengajuan beasiswa".to_string(),
                status: RequestStatus::Processing,
                admin_notes: None,
                file_url: None,
                processed_by: None,
                submitted_at: "2025-01-01T00:00:00Z".to_string(),
                approved_at: None,
                processing_at: None,
                completed_at: None,
                created_at: "2025-01-01T00:00:00Z".to_string(),
                updated_at: "2025-01-01T00:00:00Z".to_string(),
            },
            student: Some(Student {
                id: "s1".to_string(),
                name: "Budi Santoso".to_string(),
                nim: "12345678".to_string(),
                program: "Teknik Informatika".to_string(),
                email: "budi@example.com".to_string(),
                phone: "081234567890".to_string(),
                user_id: None,
                created_at: "2025-01-01T00:00:00Z".to_string(),
                updated_at: "2025-01-01T00:00:00Z".to_string(),
            }),
            letter_type: Some(LetterType {
                id: "t1".to_string(),
                code: "SK-AKTIF".to_string(),
                name: "Surat Keterangan Aktif".to_string(),
                description: None,
                addressee: Some("Kepala Bagian Akademik".to_string()),
                template: template.map(str::to_string),
                is_active: true,
                created_at: "2025-01-01T00:00:00Z".to_string(),
                updated_at: "2025-01-01T00:00:00Z".to_string(),
            }),
            download_url: None,
        }
    }

    #[test]
    fn substitution_fills_known_tokens() {
        let detail = sample_detail(None);
        let values = token_values(&detail);
        let out = substitute(
            "Nama {{nama}} ({{nim}}) mengajukan {{jenis_surat}} nomor {{nomor_pengajuan}}",
            &values,
        );
        assert_eq!(
            out,
            "Nama Budi Santoso (12345678) mengajukan Surat Keterangan Aktif \
             nomor SUK-202501-0001"
        );
    }

    #[test]
    fn substitution_leaves_unknown_tokens_and_plain_text_alone() {
        let detail = sample_detail(None);
        let values = token_values(&detail);
        assert_eq!(
            substitute("halo {{tidak_dikenal}}", &values),
            "halo {{tidak_dikenal}}"
        );
        assert_eq!(substitute("tanpa token", &values), "tanpa token");
    }

    #[test]
    fn empty_template_falls_back_to_default_layout() {
        let detail = sample_detail(Some("   "));
        assert!(matches!(layout_for(&detail), LetterLayout::Default));
        let detail = sample_detail(Some("Kepada {{nama}}"));
        match layout_for(&detail) {
            LetterLayout::Templated(body) => assert_eq!(body, "Kepada Budi Santoso"),
            LetterLayout::Default => panic!("expected templated layout"),
        }
    }
}
