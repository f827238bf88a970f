use std::fmt;

use asn1::Element;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::resolve::{self, Resolve, resolvable};

/*
RFC 5280 Section 4.1.2.5

Time ::= CHOICE {
     utcTime        UTCTime,
     generalTime    GeneralizedTime }
*/

/// A point in time together with the encoding it was (or will be) written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Time {
    Utc(NaiveDateTime),
    Generalized(NaiveDateTime),
}

impl Time {
    /// UTCTime for 1950 through 2049, GeneralizedTime otherwise.
    pub fn new(datetime: NaiveDateTime) -> Self {
        if (1950..=2049).contains(&datetime.year()) {
            Time::Utc(datetime)
        } else {
            Time::Generalized(datetime)
        }
    }

    pub fn datetime(&self) -> &NaiveDateTime {
        match self {
            Time::Utc(dt) | Time::Generalized(dt) => dt,
        }
    }
}

impl From<NaiveDateTime> for Time {
    fn from(datetime: NaiveDateTime) -> Self {
        Time::new(datetime)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.datetime().format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

impl DecodableFrom<Element> for Time {}

impl Decoder<Element, Time> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Time, Self::Error> {
        match self {
            Element::UTCTime(dt) => Ok(Time::Utc(*dt)),
            Element::GeneralizedTime(dt) => Ok(Time::Generalized(*dt)),
            _ => Err(Error::expected(Kind::Time, "UTCTime or GeneralizedTime")),
        }
    }
}

impl EncodableTo<Time> for Element {}

impl Encoder<Time, Element> for Time {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(match self {
            Time::Utc(dt) => Element::UTCTime(*dt),
            Time::Generalized(dt) => Element::GeneralizedTime(*dt),
        })
    }
}

resolvable!(Time, Time);

/*
Validity ::= SEQUENCE {
     notBefore      Time,
     notAfter       Time }
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    not_before: Time,
    not_after: Time,
}

impl Validity {
    pub fn new(not_before: Time, not_after: Time) -> Self {
        Validity {
            not_before,
            not_after,
        }
    }

    pub fn not_before(&self) -> &Time {
        &self.not_before
    }

    pub fn not_after(&self) -> &Time {
        &self.not_after
    }
}

impl DecodableFrom<Element> for Validity {}

impl Decoder<Element, Validity> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Validity, Self::Error> {
        let elements = resolve::sequence(Kind::Validity, self, 2, 2)?;
        Ok(Validity {
            not_before: Time::from_node(&elements[0])?,
            not_after: Time::from_node(&elements[1])?,
        })
    }
}

impl EncodableTo<Validity> for Element {}

impl Encoder<Validity, Element> for Validity {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            self.not_before.to_node()?,
            self.not_after.to_node()?,
        ]))
    }
}

resolvable!(Validity, Validity);

/*
RFC 5755 Section 4.1

AttCertValidityPeriod  ::= SEQUENCE {
     notBeforeTime  GeneralizedTime,
     notAfterTime   GeneralizedTime }
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttCertValidityPeriod {
    not_before_time: NaiveDateTime,
    not_after_time: NaiveDateTime,
}

impl AttCertValidityPeriod {
    pub fn new(not_before_time: NaiveDateTime, not_after_time: NaiveDateTime) -> Self {
        AttCertValidityPeriod {
            not_before_time,
            not_after_time,
        }
    }

    pub fn not_before_time(&self) -> &NaiveDateTime {
        &self.not_before_time
    }

    pub fn not_after_time(&self) -> &NaiveDateTime {
        &self.not_after_time
    }
}

impl DecodableFrom<Element> for AttCertValidityPeriod {}

impl Decoder<Element, AttCertValidityPeriod> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AttCertValidityPeriod, Self::Error> {
        let kind = Kind::AttCertValidityPeriod;
        let elements = resolve::sequence(kind, self, 2, 2)?;
        let generalized = |node: &Element| match node {
            Element::GeneralizedTime(dt) => Ok(*dt),
            _ => Err(Error::expected(kind, "GeneralizedTime")),
        };
        Ok(AttCertValidityPeriod {
            not_before_time: generalized(&elements[0])?,
            not_after_time: generalized(&elements[1])?,
        })
    }
}

impl EncodableTo<AttCertValidityPeriod> for Element {}

impl Encoder<AttCertValidityPeriod, Element> for AttCertValidityPeriod {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            Element::GeneralizedTime(self.not_before_time),
            Element::GeneralizedTime(self.not_after_time),
        ]))
    }
}

resolvable!(AttCertValidityPeriod, AttCertValidityPeriod);
