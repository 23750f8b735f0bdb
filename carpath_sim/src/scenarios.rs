//! Journey scenarios for deterministic runs.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// JRN-001: Location granted, route arrives, car drives to the end
    NominalDrive,

    /// JRN-002: User refuses location access; journey still runs
    PermissionDenied,

    /// JRN-003: Directions answer with zero routes
    EmptyDirections,

    /// JRN-004: Directions lookup fails
    DirectionsFailure,

    /// JRN-005: Second "Start Journey" mid-drive with a shorter route
    RestartJourney,

    /// JRN-006: Older lookup completes after a newer one
    StaleCompletion,

    /// JRN-007: Location stream interleaves fixes with errors
    SignalLoss,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::NominalDrive,
            ScenarioId::PermissionDenied,
            ScenarioId::EmptyDirections,
            ScenarioId::DirectionsFailure,
            ScenarioId::RestartJourney,
            ScenarioId::StaleCompletion,
            ScenarioId::SignalLoss,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::NominalDrive => "nominal_drive",
            ScenarioId::PermissionDenied => "permission_denied",
            ScenarioId::EmptyDirections => "empty_directions",
            ScenarioId::DirectionsFailure => "directions_failure",
            ScenarioId::RestartJourney => "restart_journey",
            ScenarioId::StaleCompletion => "stale_completion",
            ScenarioId::SignalLoss => "signal_loss",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::NominalDrive => "Grant location, start journey, drive every route point",
            ScenarioId::PermissionDenied => "Deny location; route still loads and the car still drives",
            ScenarioId::EmptyDirections => "Zero candidate routes; journey never starts",
            ScenarioId::DirectionsFailure => "Directions error; journey never starts",
            ScenarioId::RestartJourney => "Restart mid-drive; index resets on the new, shorter route",
            ScenarioId::StaleCompletion => "Superseded lookup lands last and is ignored",
            ScenarioId::SignalLoss => "Location errors are logged while the journey continues",
        }
    }

    /// True if the scenario expects a route to end up loaded.
    pub fn expects_route(&self) -> bool {
        !matches!(self, ScenarioId::EmptyDirections | ScenarioId::DirectionsFailure)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nominal_drive" | "nominal" | "jrn-001" => Ok(ScenarioId::NominalDrive),
            "permission_denied" | "denied" | "jrn-002" => Ok(ScenarioId::PermissionDenied),
            "empty_directions" | "empty" | "jrn-003" => Ok(ScenarioId::EmptyDirections),
            "directions_failure" | "failure" | "jrn-004" => Ok(ScenarioId::DirectionsFailure),
            "restart_journey" | "restart" | "jrn-005" => Ok(ScenarioId::RestartJourney),
            "stale_completion" | "stale" | "jrn-006" => Ok(ScenarioId::StaleCompletion),
            "signal_loss" | "jrn-007" => Ok(ScenarioId::SignalLoss),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>().unwrap(), scenario);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("JRN-006".parse::<ScenarioId>().unwrap(), ScenarioId::StaleCompletion);
        assert!("all".parse::<ScenarioId>().is_err());
    }
}
