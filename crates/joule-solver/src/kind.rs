// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Solver variants and their eager configuration checks.

use crate::config::SolverConfig;
use crate::error::ConfigurationError;
use crate::repair::PriorityRule;
use joule_model::instance::Instance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SolverKind {
    /// Exact branch-and-bound over metering-interval windows.
    #[default]
    BranchAndBound,
    /// Greedy list scheduling driven by a priority rule.
    GreedyRepair(PriorityRule),
}

impl SolverKind {
    pub fn name(&self) -> String {
        match self {
            SolverKind::BranchAndBound => "bnb".to_string(),
            SolverKind::GreedyRepair(rule) => format!("greedy-repair:{}", rule.name()),
        }
    }

    /// Rejects configurations this kind cannot run on `instance`.
    pub fn validate(&self, config: &SolverConfig, instance: &Instance) -> Result<(), ConfigurationError> {
        match self {
            SolverKind::BranchAndBound => {
                if let Some(job) = instance.jobs().iter().find(|job| job.num_operations() > 1) {
                    return Err(ConfigurationError::MultiOperationJobsUnsupported {
                        solver: self.name(),
                        job: job.index(),
                    });
                }
            }
            SolverKind::GreedyRepair(rule) => {
                if config.continuous_start_times {
                    return Err(ConfigurationError::ContinuousStartTimesUnsupported { solver: self.name() });
                }
                if rule.requires_start_times() && config.initial_start_times.is_none() {
                    return Err(ConfigurationError::MissingInitialStartTimes { solver: self.name() });
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for SolverKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigurationError::UnknownSolverKind(s.to_string());
        match s.trim().to_ascii_lowercase().as_str() {
            "bnb" | "branch-and-bound" => Ok(SolverKind::BranchAndBound),
            other => {
                let rule = other.strip_prefix("greedy-repair:").ok_or_else(unknown)?;
                rule.parse::<PriorityRule>()
                    .map(SolverKind::GreedyRepair)
                    .map_err(|_| unknown())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joule_model::index::{JobIndex, MachineIndex};
    use joule_model::instance::InstanceBuilder;
    use joule_model::start_times::IndexedStartTime;

    fn instance(multi: bool) -> Instance {
        let m0 = MachineIndex::new(0);
        let mut b = InstanceBuilder::new(1, 100, 50, 10.0);
        b.add_job([(m0, 10, 1.0)]);
        if multi {
            b.add_job([(m0, 10, 1.0), (m0, 5, 1.0)]);
        }
        b.build().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("bnb".parse::<SolverKind>(), Ok(SolverKind::BranchAndBound));
        assert_eq!(
            "greedy-repair:most-remaining-work".parse::<SolverKind>(),
            Ok(SolverKind::GreedyRepair(PriorityRule::MostRemainingWork))
        );
        assert_eq!(
            "Greedy-Repair:earliest-start-time-over-fixed-order".parse::<SolverKind>(),
            Ok(SolverKind::GreedyRepair(PriorityRule::EarliestStartTimeOverFixedOrder))
        );
        assert_eq!(
            "greedy-repair:random".parse::<SolverKind>(),
            Err(ConfigurationError::UnknownSolverKind("greedy-repair:random".to_string()))
        );
        for kind in [
            SolverKind::BranchAndBound,
            SolverKind::GreedyRepair(PriorityRule::StartTime),
            SolverKind::GreedyRepair(PriorityRule::EarliestStartTime),
        ] {
            assert_eq!(kind.to_string().parse::<SolverKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_bnb_rejects_multi_operation_jobs() {
        let config = SolverConfig::default();
        assert_eq!(SolverKind::BranchAndBound.validate(&config, &instance(false)), Ok(()));
        assert_eq!(
            SolverKind::BranchAndBound.validate(&config, &instance(true)),
            Err(ConfigurationError::MultiOperationJobsUnsupported {
                solver: "bnb".to_string(),
                job: JobIndex::new(1)
            })
        );
    }

    #[test]
    fn test_greedy_repair_requirements() {
        let inst = instance(true);
        let kind = SolverKind::GreedyRepair(PriorityRule::StartTime);
        let continuous = SolverConfig::default().with_continuous_start_times(true);
        assert!(matches!(
            kind.validate(&continuous, &inst),
            Err(ConfigurationError::ContinuousStartTimesUnsupported { .. })
        ));
        assert!(matches!(
            kind.validate(&SolverConfig::default(), &inst),
            Err(ConfigurationError::MissingInitialStartTimes { .. })
        ));
        let warm = SolverConfig::default()
            .with_initial_start_times(vec![IndexedStartTime::new(JobIndex::new(0), 0, 0.0)]);
        assert_eq!(kind.validate(&warm, &inst), Ok(()));
        assert_eq!(
            SolverKind::GreedyRepair(PriorityRule::MostRemainingWork).validate(&SolverConfig::default(), &inst),
            Ok(())
        );
    }
}
