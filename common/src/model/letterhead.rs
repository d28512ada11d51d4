use serde::{Deserialize, Serialize};

/// Institutional letterhead configuration used by the letter renderer:
/// the header block, and the identity of the signing official.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Letterhead {
    pub institution_name: String,
    pub institution_address: String,
    pub institution_city: String,
    pub institution_phone: String,
    pub institution_email: String,
    pub signer_name: String,
    pub signer_title: String,
    /// Civil-servant ID (NIP) of the signer.
    pub signer_nip: String,
}

impl Default for Letterhead {
    fn default() -> Self {
        Letterhead {
            institution_name: "UNIVERSITAS CONTOH".to_string(),
            institution_address: "Jl. Pendidikan No. 123".to_string(),
            institution_city: "Kota Pendidikan, 12345".to_string(),
            institution_phone: "(021) 1234567".to_string(),
            institution_email: "info@universitascontoh.ac.id".to_string(),
            signer_name: "Dr. Ahmad Sulaiman, M.Pd.".to_string(),
            signer_title: "Kepala Bagian Administrasi Akademik".to_string(),
            signer_nip: "197001011995031001".to_string(),
        }
    }
}
