//! Signature metadata read from XML-DSig elements.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::TrustError;

/// What a message signature declares about itself: the algorithms and the
/// certificates carried in its key info.
///
/// The wire engine verifies the cryptographic signature; the trust pipeline
/// only judges these declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureInfo {
    /// `SignatureMethod` algorithm URI.
    pub signature_algorithm: Option<String>,
    /// `DigestMethod` algorithm URI.
    pub digest_algorithm: Option<String>,
    /// Base64 DER certificates, in document order.
    pub certificates: Vec<String>,
}

impl SignatureInfo {
    /// Reads the first `Signature` element of an XML document.
    ///
    /// ## Errors
    ///
    /// Returns [`TrustError::MalformedSignature`] when the document cannot be
    /// read.
    pub fn from_xml(xml: &str) -> Result<Self, TrustError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut info = Self::default();
        let mut in_signature = false;
        let mut in_certificate = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    match e.local_name().as_ref() {
                        b"Signature" => in_signature = true,
                        b"SignatureMethod" if in_signature => {
                            info.signature_algorithm = algorithm_attribute(&e);
                        }
                        b"DigestMethod" if in_signature && info.digest_algorithm.is_none() => {
                            info.digest_algorithm = algorithm_attribute(&e);
                        }
                        b"X509Certificate" if in_signature => in_certificate = true,
                        _ => {}
                    }
                }
                Ok(Event::Text(t)) if in_certificate => {
                    let text = t
                        .unescape()
                        .map_err(|e| TrustError::MalformedSignature(e.to_string()))?;
                    info.certificates.push(text.split_whitespace().collect());
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"X509Certificate" => in_certificate = false,
                    b"Signature" => break,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(TrustError::MalformedSignature(e.to_string())),
                _ => {}
            }
        }

        Ok(info)
    }

    /// Adds a certificate to the key info.
    #[must_use]
    pub fn with_certificate(mut self, base64_der: impl Into<String>) -> Self {
        self.certificates.push(base64_der.into());
        self
    }

    /// Sets the signature algorithm URI.
    #[must_use]
    pub fn with_signature_algorithm(mut self, uri: impl Into<String>) -> Self {
        self.signature_algorithm = Some(uri.into());
        self
    }

    /// Sets the digest algorithm URI.
    #[must_use]
    pub fn with_digest_algorithm(mut self, uri: impl Into<String>) -> Self {
        self.digest_algorithm = Some(uri.into());
        self
    }
}

fn algorithm_attribute(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"Algorithm")
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNED: &str = r##"<saml2p:Response xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol" ID="_r1">
  <ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
    <ds:SignedInfo>
      <ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/>
      <ds:SignatureMethod Algorithm="http://www.w3.org/2007/05/xmldsig-more#sha256-rsa-MGF1"/>
      <ds:Reference URI="#_r1">
        <ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha512"/>
        <ds:DigestValue>AAAA</ds:DigestValue>
      </ds:Reference>
    </ds:SignedInfo>
    <ds:SignatureValue>BBBB</ds:SignatureValue>
    <ds:KeyInfo>
      <ds:X509Data>
        <ds:X509Certificate>MIIB
          Q0FB</ds:X509Certificate>
      </ds:X509Data>
    </ds:KeyInfo>
  </ds:Signature>
</saml2p:Response>"##;

    #[test]
    fn reads_algorithms_and_certificates() {
        let info = SignatureInfo::from_xml(SIGNED).unwrap();
        assert_eq!(
            info.signature_algorithm.as_deref(),
            Some("http://www.w3.org/2007/05/xmldsig-more#sha256-rsa-MGF1")
        );
        assert_eq!(
            info.digest_algorithm.as_deref(),
            Some("http://www.w3.org/2001/04/xmlenc#sha512")
        );
        assert_eq!(info.certificates, vec!["MIIBQ0FB".to_string()]);
    }

    #[test]
    fn unsigned_document_has_no_certificates() {
        let info = SignatureInfo::from_xml("<Response ID=\"_x\"/>").unwrap();
        assert!(info.certificates.is_empty());
        assert!(info.signature_algorithm.is_none());
    }
}
