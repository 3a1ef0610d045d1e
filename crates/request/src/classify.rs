//! Response classification as ordered rule tables.
//!
//! Each endpoint kind owns a table of `pattern -> verdict` rules. The first
//! matching rule decides the outcome, so precedence is the table order.

use std::fmt;

use serde_json::Value;

/// Statuses worth retrying on any endpoint
pub const RETRYABLE_STATUSES: &[u16] = &[408, 429, 500, 502, 503, 504];

/// Faucet cooldown markers, matched case sensitively
pub const RATE_LIMIT_MARKERS: &[&str] = &["exceeded the rate limit", "wait", "hour"];

/// Which rule table applies to a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// Faucet claim endpoint, answers diagnostic bodies with any status
    FaucetClaim,
    /// Captcha solving service, carries its proxy inside the payload
    CaptchaSolver,
    Generic,
}

/// Raw response payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// String value of a top level field of a json object body
    pub fn field(&self, name: &str) -> Option<String> {
        self.json()?.get(name)?.as_str().map(str::to_owned)
    }
}

/// Why a response was accepted without being the requested result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoftReason {
    RateLimited,
}

impl fmt::Display for SoftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoftReason::RateLimited => f.write_str("rate limited"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// Server answered with a retryable status
    Status(Reply),
    /// Every attempt failed at the transport level, holds the last error
    NoResponse(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Status(reply) => write!(f, "got status {}", reply.status),
            Failure::NoResponse(e) => write!(f, "no response: {e}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success(Reply),
    SoftSuccess(Reply, SoftReason),
    RetryableFailure(Failure),
    /// Reserved, no current rule produces it
    FatalFailure(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeTag {
    Success,
    SoftSuccess,
    RetryableFailure,
    FatalFailure,
}

impl Outcome {
    pub fn tag(&self) -> OutcomeTag {
        match self {
            Outcome::Success(_) => OutcomeTag::Success,
            Outcome::SoftSuccess(..) => OutcomeTag::SoftSuccess,
            Outcome::RetryableFailure(_) => OutcomeTag::RetryableFailure,
            Outcome::FatalFailure(_) => OutcomeTag::FatalFailure,
        }
    }

    /// Response carried by the outcome, if any
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Outcome::Success(reply)
            | Outcome::SoftSuccess(reply, _)
            | Outcome::RetryableFailure(Failure::Status(reply)) => Some(reply),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Pattern {
    Status2xx,
    StatusIn(&'static [u16]),
    /// String field of a json object body containing any of the needles
    FieldContains(&'static str, &'static [&'static str]),
    Any,
}

impl Pattern {
    pub fn matches(&self, reply: &Reply) -> bool {
        match self {
            Pattern::Status2xx => reply.is_success(),
            Pattern::StatusIn(codes) => codes.contains(&reply.status),
            Pattern::FieldContains(field, needles) => reply
                .field(field)
                .is_some_and(|text| needles.iter().any(|n| text.contains(n))),
            Pattern::Any => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Success,
    SoftSuccess(SoftReason),
    Retryable,
}

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub name: &'static str,
    pub pattern: Pattern,
    pub verdict: Verdict,
}

const TERMINAL: Rule = Rule {
    name: "terminal",
    pattern: Pattern::Any,
    verdict: Verdict::Success,
};

/// The faucet returns diagnostic json regardless of status, so a cooldown
/// `msg` wins over any status code. Non retryable errors are terminal and get
/// interpreted by the claim orchestrator.
pub const FAUCET_RULES: &[Rule] = &[
    Rule {
        name: "rate-limit-msg",
        pattern: Pattern::FieldContains("msg", RATE_LIMIT_MARKERS),
        verdict: Verdict::SoftSuccess(SoftReason::RateLimited),
    },
    Rule {
        name: "2xx",
        pattern: Pattern::Status2xx,
        verdict: Verdict::Success,
    },
    Rule {
        name: "retryable-status",
        pattern: Pattern::StatusIn(RETRYABLE_STATUSES),
        verdict: Verdict::Retryable,
    },
    TERMINAL,
];

pub const GENERIC_RULES: &[Rule] = &[
    Rule {
        name: "retryable-status",
        pattern: Pattern::StatusIn(RETRYABLE_STATUSES),
        verdict: Verdict::Retryable,
    },
    TERMINAL,
];

pub fn rules_for(kind: EndpointKind) -> &'static [Rule] {
    match kind {
        EndpointKind::FaucetClaim => FAUCET_RULES,
        EndpointKind::CaptchaSolver | EndpointKind::Generic => GENERIC_RULES,
    }
}

/// First rule of the table for `kind` matching the reply
pub fn matching_rule(kind: EndpointKind, reply: &Reply) -> &'static Rule {
    rules_for(kind)
        .iter()
        .find(|rule| rule.pattern.matches(reply))
        .unwrap_or(&TERMINAL)
}

/// Classify a response. Pure in `(status, body, kind)`.
pub fn classify(kind: EndpointKind, reply: Reply) -> Outcome {
    match matching_rule(kind, &reply).verdict {
        Verdict::Success => Outcome::Success(reply),
        Verdict::SoftSuccess(reason) => Outcome::SoftSuccess(reply, reason),
        Verdict::Retryable => Outcome::RetryableFailure(Failure::Status(reply)),
    }
}
