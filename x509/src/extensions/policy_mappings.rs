use asn1::Element;
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::extensions::{Extension, PolicyId};
use crate::oid;
use crate::resolve::{self, Resolve, resolvable};

/*
RFC 5280 Section 4.2.1.5
PolicyMappings ::= SEQUENCE SIZE (1..MAX) OF SEQUENCE {
     issuerDomainPolicy      CertPolicyId,
     subjectDomainPolicy     CertPolicyId }
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMapping {
    pub issuer_domain_policy: PolicyId,
    pub subject_domain_policy: PolicyId,
}

impl PolicyMapping {
    pub fn new(issuer_domain_policy: PolicyId, subject_domain_policy: PolicyId) -> Self {
        PolicyMapping {
            issuer_domain_policy,
            subject_domain_policy,
        }
    }
}

impl DecodableFrom<Element> for PolicyMapping {}

impl Decoder<Element, PolicyMapping> for Element {
    type Error = Error;

    fn decode(&self) -> Result<PolicyMapping, Self::Error> {
        let elements = resolve::sequence(Kind::PolicyMapping, self, 2, 2)?;
        Ok(PolicyMapping {
            issuer_domain_policy: PolicyId::from_node(&elements[0])?,
            subject_domain_policy: PolicyId::from_node(&elements[1])?,
        })
    }
}

impl EncodableTo<PolicyMapping> for Element {}

impl Encoder<PolicyMapping, Element> for PolicyMapping {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            self.issuer_domain_policy.to_node()?,
            self.subject_domain_policy.to_node()?,
        ]))
    }
}

resolvable!(PolicyMapping, PolicyMapping);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMappings {
    mappings: Vec<PolicyMapping>,
}

impl PolicyMappings {
    pub fn new(mappings: Vec<PolicyMapping>) -> Result<Self, Error> {
        resolve::check_count(Kind::PolicyMappings, mappings.len(), 1, None)?;
        Ok(PolicyMappings { mappings })
    }

    pub fn mappings(&self) -> &[PolicyMapping] {
        &self.mappings
    }
}

impl Extension for PolicyMappings {
    const OID: &'static str = oid::POLICY_MAPPINGS;
}

impl DecodableFrom<Element> for PolicyMappings {}

impl Decoder<Element, PolicyMappings> for Element {
    type Error = Error;

    fn decode(&self) -> Result<PolicyMappings, Self::Error> {
        let mappings = resolve::non_empty_sequence_of(Kind::PolicyMappings, self)?
            .iter()
            .map(PolicyMapping::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PolicyMappings { mappings })
    }
}

impl EncodableTo<PolicyMappings> for Element {}

impl Encoder<PolicyMappings, Element> for PolicyMappings {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(
            self.mappings
                .iter()
                .map(|m| m.to_node())
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }
}

resolvable!(PolicyMappings, PolicyMappings);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Violation;
    use hex_literal::hex;
    use rstest::rstest;

    #[test]
    fn test_policy_mappings_round_trip() {
        // 1.2.3.4 -> 1.2.3.5
        let der = hex!("30 0c 30 0a 06 03 2a 03 04 06 03 2a 03 05");
        let mappings = PolicyMappings::from_der(&der).unwrap();
        let mapping = &mappings.mappings()[0];
        assert_eq!("1.2.3.4", mapping.issuer_domain_policy.to_string());
        assert_eq!("1.2.3.5", mapping.subject_domain_policy.to_string());
        assert_eq!(der.to_vec(), mappings.to_der().unwrap());
    }

    #[rstest(
        der,
        expected,
        case(hex!("30 00").to_vec(), Violation::ElementCount { min: 1, max: None, actual: 0 }),
        case(
            hex!("30 07 30 05 06 03 2a 03 04").to_vec(),
            Violation::ElementCount { min: 2, max: Some(2), actual: 1 }
        ),
    )]
    fn test_policy_mappings_decode_failure(der: Vec<u8>, expected: Violation) {
        let err = PolicyMappings::from_der(&der).unwrap_err();
        assert_eq!(Some(&expected), err.violation());
    }
}
