//! Remote server registration requirements.

use crate::{CapabilityCache, Verdict};
use bulwark_core::{NormalizedEvent, RequestContext, ServerName};
use bulwark_error::ProbeError;
use bulwark_probe::{
    RegistrationProbe, ServerDiscovery, UserInteractiveFlows, fallback_base_url, stages,
};
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

/// Redacts messages from users whose home server lets anyone register
/// without the configured verification stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct ServerRequirementsProtection {
    /// Whether the protection runs
    #[serde(default)]
    enabled: bool,
    /// Registration must require a CAPTCHA
    #[serde(default)]
    require_captcha: bool,
    /// Registration must verify an email address
    #[serde(default)]
    require_email: bool,
    /// Registration must verify a phone number
    #[serde(default)]
    require_phone: bool,
    /// Registration must require a token
    #[serde(default)]
    require_registration_token: bool,
    /// The server must delegate authentication to an external provider
    #[serde(default)]
    require_external_auth: bool,
}

impl ServerRequirementsProtection {
    /// Whether the protection runs.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The requirement set, used as the capability cache key.
    pub fn requirements(&self) -> RegistrationRequirements {
        RegistrationRequirements {
            captcha: self.require_captcha,
            email: self.require_email,
            phone: self.require_phone,
            registration_token: self.require_registration_token,
            external_auth: self.require_external_auth,
        }
    }

    /// Checks whether `server` meets this protection's requirements.
    pub async fn check_server(
        &self,
        ctx: &RequestContext,
        checker: &ServerRequirementsChecker,
        server: &ServerName,
    ) -> Result<bool, ProbeError> {
        checker.check_server(ctx, &self.requirements(), server).await
    }

    /// Decides whether `event` should be redacted based on its sender's home server.
    pub async fn evaluate(
        &self,
        ctx: &RequestContext,
        event: &NormalizedEvent,
        checker: &ServerRequirementsChecker,
    ) -> Result<Verdict, ProbeError> {
        let Some(server) = event.sender().server_name() else {
            trace!(sender = %event.sender(), "Sender has no home server");
            return Ok(Verdict::Pass);
        };
        if self.check_server(ctx, checker, &server).await? {
            Ok(Verdict::Pass)
        } else {
            Ok(Verdict::redact(format!(
                "home server {} does not meet registration requirements",
                server
            )))
        }
    }
}

/// The registration stages a server must enforce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegistrationRequirements {
    /// CAPTCHA stage required
    pub captcha: bool,
    /// Email verification required
    pub email: bool,
    /// Phone verification required
    pub phone: bool,
    /// Registration token required
    pub registration_token: bool,
    /// External authentication required
    pub external_auth: bool,
}

impl RegistrationRequirements {
    /// Whether the first offered flow includes every required stage.
    ///
    /// No flows, or a first flow without stages, never meets requirements.
    ///
    /// ```
    /// use bulwark_probe::{AuthFlow, UserInteractiveFlows, stages};
    /// use bulwark_protections::RegistrationRequirements;
    ///
    /// let requirements = RegistrationRequirements { captcha: true, ..Default::default() };
    /// let flows = UserInteractiveFlows::new(vec![
    ///     AuthFlow::new([stages::DUMMY]),
    ///     AuthFlow::new([stages::RECAPTCHA]),
    /// ]);
    /// assert!(!requirements.met_by(&flows));
    /// ```
    pub fn met_by(&self, flows: &UserInteractiveFlows) -> bool {
        let Some(flow) = flows.first_flow() else {
            return false;
        };
        if flow.stages().is_empty() {
            return false;
        }
        let required = [
            (self.captcha, stages::RECAPTCHA),
            (self.email, stages::EMAIL_IDENTITY),
            (self.phone, stages::MSISDN),
            (self.registration_token, stages::REGISTRATION_TOKEN),
        ];
        required
            .iter()
            .filter(|(needed, _)| *needed)
            .all(|(_, stage)| flow.has_stage(stage))
    }
}

impl fmt::Display for RegistrationRequirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.captcha, "captcha"),
            (self.email, "email"),
            (self.phone, "phone"),
            (self.registration_token, "registration_token"),
            (self.external_auth, "external_auth"),
        ];
        let enabled: Vec<&str> = names
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect();
        if enabled.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", enabled.join("+"))
        }
    }
}

/// Probes remote servers and caches the verdicts.
#[derive(Clone)]
pub struct ServerRequirementsChecker {
    discovery: Arc<dyn ServerDiscovery>,
    probe: Arc<dyn RegistrationProbe>,
    cache: Arc<CapabilityCache>,
}

impl fmt::Debug for ServerRequirementsChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerRequirementsChecker")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ServerRequirementsChecker {
    /// Creates a checker over the given probe ports and cache.
    pub fn new(
        discovery: Arc<dyn ServerDiscovery>,
        probe: Arc<dyn RegistrationProbe>,
        cache: Arc<CapabilityCache>,
    ) -> Self {
        Self {
            discovery,
            probe,
            cache,
        }
    }

    /// The verdict cache.
    pub fn cache(&self) -> &Arc<CapabilityCache> {
        &self.cache
    }

    /// Whether `server` meets `requirements`.
    ///
    /// Verdicts are cached for [`crate::CAPABILITY_TTL`]. Probe failures,
    /// including cancellation and deadline expiry of `ctx`, are returned
    /// without caching anything.
    #[instrument(skip(self, ctx), fields(server = %server, requirements = %requirements))]
    pub async fn check_server(
        &self,
        ctx: &RequestContext,
        requirements: &RegistrationRequirements,
        server: &ServerName,
    ) -> Result<bool, ProbeError> {
        if let Some(verdict) = self.cache.get(requirements, server) {
            trace!(verdict, "Using cached server verdict");
            return Ok(verdict);
        }

        let discovered = ctx.run(self.discovery.discover(server)).await??;
        let base_url = match discovered.filter(|url| !url.is_empty()) {
            Some(url) => url,
            None => {
                debug!("Discovery found no base URL, using fallback");
                fallback_base_url(server)
            }
        };

        if requirements.external_auth {
            let verdict = match ctx.run(self.probe.auth_metadata(&base_url)).await? {
                Ok(()) => true,
                Err(e) if e.is_unrecognized() => false,
                Err(e) => {
                    warn!(error = %e, base_url = %base_url, "Auth metadata probe failed");
                    return Err(e);
                }
            };
            return Ok(self.remember(requirements, server, verdict));
        }

        let verdict = match ctx.run(self.probe.register(&base_url)).await? {
            Err(e) if e.is_forbidden() => {
                debug!("Registration is closed");
                true
            }
            Err(e) => {
                warn!(error = %e, base_url = %base_url, "Registration probe failed");
                return Err(e);
            }
            Ok(None) => {
                debug!("Registration completed without interactive authentication");
                false
            }
            Ok(Some(flows)) => requirements.met_by(&flows),
        };
        Ok(self.remember(requirements, server, verdict))
    }

    fn remember(
        &self,
        requirements: &RegistrationRequirements,
        server: &ServerName,
        verdict: bool,
    ) -> bool {
        info!(server = %server, verdict, "Caching server requirements verdict");
        self.cache.insert(*requirements, server.clone(), verdict);
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_probe::AuthFlow;

    fn flows(stages: &[&[&str]]) -> UserInteractiveFlows {
        UserInteractiveFlows::new(stages.iter().map(|s| AuthFlow::new(s.iter().copied())).collect())
    }

    #[test]
    fn test_only_first_flow_counts() {
        let requirements = RegistrationRequirements {
            captcha: true,
            email: true,
            ..Default::default()
        };
        assert!(requirements.met_by(&flows(&[&[stages::RECAPTCHA, stages::EMAIL_IDENTITY]])));
        assert!(!requirements.met_by(&flows(&[
            &[stages::RECAPTCHA],
            &[stages::RECAPTCHA, stages::EMAIL_IDENTITY]
        ])));
    }

    #[test]
    fn test_empty_flows_fail() {
        let requirements = RegistrationRequirements::default();
        assert!(!requirements.met_by(&flows(&[])));
        assert!(!requirements.met_by(&flows(&[&[]])));
        assert!(requirements.met_by(&flows(&[&[stages::DUMMY]])));
    }

    #[test]
    fn test_requirements_display() {
        let requirements = ServerRequirementsProtection::default()
            .with_require_phone(true)
            .with_require_registration_token(true)
            .requirements();
        assert_eq!(requirements.to_string(), "phone+registration_token");
        assert_eq!(RegistrationRequirements::default().to_string(), "none");
    }
}
