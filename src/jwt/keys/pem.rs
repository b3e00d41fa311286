use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use url::Url;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::ParsedExtension;

use super::{rsa_from_pkcs1_der, KeyMaterial};
use crate::error::Error;

const PEM_BEGIN: &str = "-----BEGIN ";
const PEM_END: &str = "-----END ";
const PEM_DASHES: &str = "-----";

/// Result of decoding one configured key entry.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// A key usable immediately, with the id it is stored under.
    Local { kid: String, key: KeyMaterial },
    /// A JWKS endpoint, fetched later by the refresher.
    Remote(Url),
}

/// Decodes one configuration entry: a PEM certificate, a PEM public key, or a JWKS URL.
///
/// `local_index` is the id given to a bare public key, which carries no id of its own.
pub fn decode_key_material(input: &str, local_index: usize) -> Result<KeySource, Error> {
    if let Some((block, rest)) = split_first_block(input) {
        if let Ok(parsed) = pem::parse(block) {
            if !rest.trim().is_empty() {
                return Err(Error::Config("extra data after PEM block".to_string()));
            }
            return decode_pem_block(&parsed, local_index);
        }
    }
    match Url::parse(input.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(KeySource::Remote(url))
        }
        _ => Err(Error::Config(
            "not a certificate, public key, or JWK URL".to_string(),
        )),
    }
}

fn decode_pem_block(block: &pem::Pem, local_index: usize) -> Result<KeySource, Error> {
    match block.tag() {
        "CERTIFICATE" => decode_certificate(block.contents()),
        "PUBLIC KEY" => {
            let key = KeyMaterial::from_public_key_der(block.contents())
                .map_err(|e| Error::Config(format!("failed to parse a PEM public key: {e}")))?;
            Ok(KeySource::Local {
                kid: local_index.to_string(),
                key,
            })
        }
        "RSA PUBLIC KEY" => {
            let key = match KeyMaterial::from_public_key_der(block.contents()) {
                Ok(key) => key,
                Err(_) => rsa_from_pkcs1_der(block.contents())
                    .map(KeyMaterial::Rsa)
                    .map_err(|e| {
                        Error::Config(format!("failed to parse a PEM public key: {e}"))
                    })?,
            };
            Ok(KeySource::Local {
                kid: local_index.to_string(),
                key,
            })
        }
        other => Err(Error::Config(format!(
            "unsupported PEM block type {other}; expected CERTIFICATE or PUBLIC KEY"
        ))),
    }
}

fn decode_certificate(der: &[u8]) -> Result<KeySource, Error> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| Error::Config(format!("failed to parse a PEM certificate: {e}")))?;
    let key = KeyMaterial::from_public_key_der(cert.public_key().raw)
        .map_err(|e| Error::Config(format!("failed to parse certificate public key: {e}")))?;
    let kid = match subject_key_identifier(&cert) {
        Some(ski) => URL_SAFE_NO_PAD.encode(ski),
        None => key.thumbprint(),
    };
    Ok(KeySource::Local { kid, key })
}

fn subject_key_identifier<'a>(cert: &'a X509Certificate<'_>) -> Option<&'a [u8]> {
    cert.extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::SubjectKeyIdentifier(id) if !id.0.is_empty() => Some(id.0),
            _ => None,
        })
}

/// Splits off the first `-----BEGIN ...-----END ...-----` block and the text after it.
fn split_first_block(input: &str) -> Option<(&str, &str)> {
    let begin = input.find(PEM_BEGIN)?;
    let end_marker = begin + input[begin..].find(PEM_END)?;
    let label_start = end_marker + PEM_END.len();
    let end = label_start + input[label_start..].find(PEM_DASHES)? + PEM_DASHES.len();
    Some((&input[begin..end], &input[end..]))
}
