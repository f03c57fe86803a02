//! Interactive authentication flow descriptors.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Well-known interactive authentication stage names.
pub mod stages {
    /// CAPTCHA stage.
    pub const RECAPTCHA: &str = "m.login.recaptcha";
    /// Email verification stage.
    pub const EMAIL_IDENTITY: &str = "m.login.email.identity";
    /// Phone number verification stage.
    pub const MSISDN: &str = "m.login.msisdn";
    /// Registration token stage.
    pub const REGISTRATION_TOKEN: &str = "m.login.registration_token";
    /// No-op stage.
    pub const DUMMY: &str = "m.login.dummy";
}

/// One sequence of stages a client may complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct AuthFlow {
    /// Stage names, in order
    #[serde(default)]
    stages: Vec<String>,
}

impl AuthFlow {
    /// Creates a flow from stage names.
    pub fn new<I, S>(stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stages: stages.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the flow includes `stage`.
    pub fn has_stage(&self, stage: &str) -> bool {
        self.stages.iter().any(|s| s == stage)
    }
}

/// Body of a `401` interactive authentication response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct UserInteractiveFlows {
    /// Offered flows, in server preference order
    #[serde(default)]
    flows: Vec<AuthFlow>,
    /// Session identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<String>,
}

impl UserInteractiveFlows {
    /// Creates a response from flows.
    pub fn new(flows: Vec<AuthFlow>) -> Self {
        Self {
            flows,
            session: None,
        }
    }

    /// The first offered flow, the only one requirement checks consider.
    pub fn first_flow(&self) -> Option<&AuthFlow> {
        self.flows.first()
    }
}
