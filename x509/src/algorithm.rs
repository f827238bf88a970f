use asn1::{BitString, Element, ObjectIdentifier};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::resolve::{self, LegacyForm, Resolve, resolvable};

/*
RFC 5280 Section 4.1.1.2

AlgorithmIdentifier  ::=  SEQUENCE  {
     algorithm               OBJECT IDENTIFIER,
     parameters              ANY DEFINED BY algorithm OPTIONAL  }
*/

/// The three states of the parameters field. An explicit NULL is not the
/// same as an absent field and re-encodes differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmParameters {
    Absent,
    Null,
    Value(Element),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmIdentifier {
    algorithm: ObjectIdentifier,
    parameters: AlgorithmParameters,
}

impl AlgorithmIdentifier {
    pub fn new(algorithm: ObjectIdentifier, parameters: AlgorithmParameters) -> Self {
        AlgorithmIdentifier {
            algorithm,
            parameters,
        }
    }

    /// Builds an identifier from a dotted OID string with no parameters.
    #[deprecated(note = "use `AlgorithmIdentifier::new` and state the parameters explicitly")]
    pub fn from_oid_str(oid: &str) -> Result<Self, Error> {
        let oid = oid.parse::<ObjectIdentifier>()?;
        Self::from_legacy(LegacyForm::Oid(oid))
    }

    pub fn algorithm(&self) -> &ObjectIdentifier {
        &self.algorithm
    }

    pub fn parameters(&self) -> &AlgorithmParameters {
        &self.parameters
    }

    pub fn parameters_present(&self) -> bool {
        !matches!(self.parameters, AlgorithmParameters::Absent)
    }
}

impl DecodableFrom<Element> for AlgorithmIdentifier {}

impl Decoder<Element, AlgorithmIdentifier> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AlgorithmIdentifier, Self::Error> {
        let kind = Kind::AlgorithmIdentifier;
        let elements = resolve::sequence(kind, self, 1, 2)?;
        let algorithm = resolve::oid(kind, &elements[0])?.clone();
        let parameters = match elements.get(1) {
            None => AlgorithmParameters::Absent,
            Some(Element::Null) => AlgorithmParameters::Null,
            Some(value) => AlgorithmParameters::Value(value.clone()),
        };
        Ok(AlgorithmIdentifier {
            algorithm,
            parameters,
        })
    }
}

impl EncodableTo<AlgorithmIdentifier> for Element {}

impl Encoder<AlgorithmIdentifier, Element> for AlgorithmIdentifier {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = vec![Element::ObjectIdentifier(self.algorithm.clone())];
        match &self.parameters {
            AlgorithmParameters::Absent => {}
            AlgorithmParameters::Null => elements.push(Element::Null),
            AlgorithmParameters::Value(value) => elements.push(value.clone()),
        }
        Ok(Element::Sequence(elements))
    }
}

impl Resolve for AlgorithmIdentifier {
    const KIND: Kind = Kind::AlgorithmIdentifier;

    fn from_node(node: &Element) -> Result<Self, Error> {
        node.decode()
    }

    fn to_node(&self) -> Result<Element, Error> {
        self.encode()
    }

    fn from_legacy(form: LegacyForm) -> Result<Self, Error> {
        match form {
            LegacyForm::Oid(algorithm) => Ok(AlgorithmIdentifier::new(
                algorithm,
                AlgorithmParameters::Absent,
            )),
            other => Err(Error::UnsupportedLegacyForm {
                kind: Self::KIND,
                form: other.describe(),
            }),
        }
    }
}

/*
SubjectPublicKeyInfo  ::=  SEQUENCE  {
     algorithm            AlgorithmIdentifier,
     subjectPublicKey     BIT STRING  }
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPublicKeyInfo {
    algorithm: AlgorithmIdentifier,
    subject_public_key: BitString,
}

impl SubjectPublicKeyInfo {
    pub fn new(algorithm: AlgorithmIdentifier, subject_public_key: BitString) -> Self {
        SubjectPublicKeyInfo {
            algorithm,
            subject_public_key,
        }
    }

    pub fn algorithm(&self) -> &AlgorithmIdentifier {
        &self.algorithm
    }

    pub fn subject_public_key(&self) -> &BitString {
        &self.subject_public_key
    }

    /// Key bits without the unused-bits octet.
    pub fn key_bytes(&self) -> &[u8] {
        self.subject_public_key.as_bytes()
    }

    /// Parses the key bits as DER, for key types whose key is itself a
    /// structure (an RSAPublicKey SEQUENCE, for instance).
    pub fn key_node(&self) -> Result<Element, Error> {
        Ok(Element::from_der(self.key_bytes())?)
    }
}

impl DecodableFrom<Element> for SubjectPublicKeyInfo {}

impl Decoder<Element, SubjectPublicKeyInfo> for Element {
    type Error = Error;

    fn decode(&self) -> Result<SubjectPublicKeyInfo, Self::Error> {
        let kind = Kind::SubjectPublicKeyInfo;
        let elements = resolve::sequence(kind, self, 2, 2)?;
        Ok(SubjectPublicKeyInfo {
            algorithm: AlgorithmIdentifier::from_node(&elements[0])?,
            subject_public_key: resolve::bit_string(kind, &elements[1])?.clone(),
        })
    }
}

impl EncodableTo<SubjectPublicKeyInfo> for Element {}

impl Encoder<SubjectPublicKeyInfo, Element> for SubjectPublicKeyInfo {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            self.algorithm.to_node()?,
            Element::BitString(self.subject_public_key.clone()),
        ]))
    }
}

resolvable!(SubjectPublicKeyInfo, SubjectPublicKeyInfo);
