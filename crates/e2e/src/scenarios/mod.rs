//! The test suites, written against the page objects
//!
//! Each scenario is built fresh for every run from its [`ScenarioFactory`],
//! so state captured in `run` (a generated card title, say) is still there
//! when the runner calls `teardown`.

use async_trait::async_trait;

use crate::error::E2eResult;
use crate::fixtures::Fixtures;

pub mod card_workflow;
pub mod kanban_board;
pub mod login;

#[async_trait]
pub trait Scenario: Send {
    /// Suite the scenario belongs to, e.g. `login`
    fn suite(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// Whether the runner logs in and opens the board before `run`
    fn needs_board(&self) -> bool {
        true
    }

    /// Whether the scenario signs in as the automation user
    fn needs_credentials(&self) -> bool {
        true
    }

    async fn run(&mut self, fixtures: &mut Fixtures) -> E2eResult<()>;

    /// Runs after `run` whether it passed or not
    async fn teardown(&mut self, _fixtures: &mut Fixtures) -> E2eResult<()> {
        Ok(())
    }
}

pub type ScenarioFactory = fn() -> Box<dyn Scenario>;

pub(crate) fn factory<S: Scenario + Default + 'static>() -> Box<dyn Scenario> {
    Box::new(S::default())
}

/// Every registered scenario, in suite order
pub fn all_scenarios() -> Vec<ScenarioFactory> {
    let mut scenarios = Vec::new();
    scenarios.extend(login::scenarios());
    scenarios.extend(kanban_board::scenarios());
    scenarios.extend(card_workflow::scenarios());
    scenarios
}

/// Scenarios whose name contains `filter`, ignoring case
pub fn scenarios_matching(filter: &str) -> Vec<ScenarioFactory> {
    let filter = filter.to_lowercase();
    select(all_scenarios(), |scenario| {
        scenario.name().to_lowercase().contains(&filter)
    })
}

/// Keep the factories whose scenario satisfies `predicate`
pub fn select<P>(factories: Vec<ScenarioFactory>, predicate: P) -> Vec<ScenarioFactory>
where
    P: Fn(&dyn Scenario) -> bool,
{
    factories
        .into_iter()
        .filter(|factory| predicate(factory().as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry() {
        let scenarios: Vec<Box<dyn Scenario>> = all_scenarios().into_iter().map(|f| f()).collect();
        let names: Vec<(&str, &str)> = scenarios.iter().map(|s| (s.suite(), s.name())).collect();
        assert_eq!(
            names,
            vec![
                ("login", "Enter invalid credentials"),
                ("login", "Enter valid credentials"),
                ("kanbanBoard", "Assert lists on board"),
                ("kanbanBoard", "Assert Project Resources list has cards"),
                ("cardWorkflow", "Card workflow"),
            ]
        );

        let unique: HashSet<&str> = names.iter().map(|(_, name)| *name).collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        assert_eq!(scenarios_matching("CREDENTIALS").len(), 2);
        assert_eq!(scenarios_matching("card").len(), 2);
        assert!(scenarios_matching("no such test").is_empty());
    }

    #[test]
    fn test_only_login_suite_skips_board() {
        for scenario in all_scenarios().into_iter().map(|f| f()) {
            assert_eq!(scenario.needs_board(), scenario.suite() != "login", "{}", scenario.name());
        }
    }

    #[test]
    fn test_credential_free_selection() {
        let names: Vec<&str> = select(all_scenarios(), |scenario| !scenario.needs_credentials())
            .into_iter()
            .map(|factory| factory().name())
            .collect();
        assert_eq!(names, vec!["Enter invalid credentials"]);
    }
}
