//! Localized, display-safe messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{ClassifiedError, ErrorKind};

/// Message catalog language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Bahasa Indonesia
    #[default]
    #[serde(rename = "id")]
    Indonesian,

    #[serde(rename = "en")]
    English,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Indonesian => "id",
            Locale::English => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" | "id-id" | "indonesian" => Ok(Locale::Indonesian),
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::English),
            other => Err(format!("Unsupported locale: '{}' (expected 'id' or 'en')", other)),
        }
    }
}

/// The template message for a kind.
pub fn template(kind: ErrorKind, locale: Locale) -> &'static str {
    match locale {
        Locale::Indonesian => match kind {
            ErrorKind::NetworkError => {
                "Tidak dapat terhubung ke server. Periksa koneksi internet Anda."
            }
            ErrorKind::TimeoutError => "Permintaan memakan waktu terlalu lama. Silakan coba lagi.",
            ErrorKind::CorsError => {
                "Permintaan diblokir oleh kebijakan keamanan browser. Halaman akan dimuat ulang."
            }
            ErrorKind::ValidationError => {
                "Data yang dikirim tidak valid. Periksa kembali isian Anda."
            }
            ErrorKind::AuthenticationError => "Sesi Anda telah berakhir. Silakan masuk kembali.",
            ErrorKind::AuthorizationError => {
                "Anda tidak memiliki izin untuk melakukan tindakan ini."
            }
            ErrorKind::NotFoundError => "Data yang diminta tidak ditemukan.",
            ErrorKind::ServerError => {
                "Terjadi kesalahan pada server. Silakan coba beberapa saat lagi."
            }
            ErrorKind::ApiError => "Terjadi kesalahan saat memproses permintaan.",
            ErrorKind::UnknownError => "Terjadi kesalahan yang tidak terduga.",
        },
        Locale::English => match kind {
            ErrorKind::NetworkError => {
                "Unable to reach the server. Please check your internet connection."
            }
            ErrorKind::TimeoutError => "The request took too long. Please try again.",
            ErrorKind::CorsError => {
                "The request was blocked by the browser's security policy. The page will reload."
            }
            ErrorKind::ValidationError => {
                "The submitted data is invalid. Please review your input."
            }
            ErrorKind::AuthenticationError => "Your session has expired. Please sign in again.",
            ErrorKind::AuthorizationError => "You do not have permission to perform this action.",
            ErrorKind::NotFoundError => "The requested data could not be found.",
            ErrorKind::ServerError => "The server encountered an error. Please try again later.",
            ErrorKind::ApiError => "Something went wrong while processing the request.",
            ErrorKind::UnknownError => "An unexpected error occurred.",
        },
    }
}

/// Pick the message for a freshly classified failure.
pub fn resolve(kind: ErrorKind, server_message: Option<&str>, locale: Locale) -> String {
    match server_message {
        Some(message) if kind.prefers_server_message() && !message.trim().is_empty() => {
            message.to_string()
        }
        _ => template(kind, locale).to_string(),
    }
}

/// The message safe to show for an already classified error.
///
/// Kinds that never surface server text always get their template, even
/// when a caller constructed the error with a custom message.
pub fn display_message(error: &ClassifiedError, locale: Locale) -> String {
    resolve(error.kind(), Some(error.message()), locale)
}
