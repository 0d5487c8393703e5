use crate::fixer::{FixerMeta, ModelFixer};
use pbifix_tom::{DATA_SOURCE_VERSION_V3, Model, ModelSession};
use pbifix_types::{Assessment, Layer, Outcome};

/// `defaultPowerBIDataSourceVersion` is `powerBI_V3`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDataSourceVersion;

impl DefaultDataSourceVersion {
    pub const META: FixerMeta = FixerMeta {
        key: "default-datasource-version",
        title: "Set Default Data Source Version",
        layer: Layer::Model,
        description: "Sets the model's default Power BI data source version to powerBI_V3, which \
                      XMLA write operations require.",
    };
}

impl ModelFixer for DefaultDataSourceVersion {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn assess(&self, model: &Model) -> anyhow::Result<Assessment> {
        match model.data_source_version() {
            Some(v) if v.eq_ignore_ascii_case(DATA_SOURCE_VERSION_V3) => Ok(Assessment::clean(
                format!("default data source version is already '{DATA_SOURCE_VERSION_V3}'"),
            )),
            current => Ok(Assessment::pending(
                format!(
                    "default data source version is '{}'; it would be set to '{DATA_SOURCE_VERSION_V3}'",
                    current.unwrap_or("unset")
                ),
                vec!["model".to_string()],
            )),
        }
    }

    fn apply(&self, session: &mut dyn ModelSession) -> anyhow::Result<Outcome> {
        let assessment = self.assess(session.model())?;
        if !assessment.would_change {
            return Ok(Outcome::unchanged(assessment.detail));
        }
        session
            .model_mut()?
            .set_data_source_version(DATA_SOURCE_VERSION_V3);
        Ok(Outcome::changed(
            1,
            format!("default data source version set to '{DATA_SOURCE_VERSION_V3}'"),
        ))
    }
}

/// `discourageImplicitMeasures` is on.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscourageImplicitMeasures;

impl DiscourageImplicitMeasures {
    pub const META: FixerMeta = FixerMeta {
        key: "discourage-implicit-measures",
        title: "Discourage Implicit Measures",
        layer: Layer::Model,
        description: "Turns on the model flag that stops report authors from dragging raw \
                      numeric columns into visuals as implicit measures.",
    };
}

impl ModelFixer for DiscourageImplicitMeasures {
    fn meta(&self) -> FixerMeta {
        Self::META
    }

    fn assess(&self, model: &Model) -> anyhow::Result<Assessment> {
        if model.discourages_implicit_measures() {
            Ok(Assessment::clean("implicit measures are already discouraged"))
        } else {
            Ok(Assessment::pending(
                "discourageImplicitMeasures would be turned on",
                vec!["model".to_string()],
            ))
        }
    }

    fn apply(&self, session: &mut dyn ModelSession) -> anyhow::Result<Outcome> {
        let assessment = self.assess(session.model())?;
        if !assessment.would_change {
            return Ok(Outcome::unchanged(assessment.detail));
        }
        session.model_mut()?.set_discourage_implicit_measures(true);
        Ok(Outcome::changed(1, "discourageImplicitMeasures turned on"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbifix_tom::InMemorySession;
    use pretty_assertions::assert_eq;

    #[test]
    fn version_is_compared_case_insensitively() {
        let mut model = Model::default();
        model.set_data_source_version("PowerBI_V3");
        assert!(!DefaultDataSourceVersion.assess(&model).unwrap().would_change);
    }

    #[test]
    fn legacy_version_is_upgraded_once() {
        let mut model = Model::default();
        model.set_data_source_version("powerBI_V1");
        let mut session = InMemorySession::from_model("Sales", model);

        let first = DefaultDataSourceVersion.apply(&mut session).unwrap();
        assert_eq!(first.changed, 1);
        assert_eq!(session.model().data_source_version(), Some("powerBI_V3"));

        let second = DefaultDataSourceVersion.apply(&mut session).unwrap();
        assert!(!second.made_change());
    }

    #[test]
    fn readonly_session_is_refused() {
        let mut session = InMemorySession::from_model("Sales", Model::default()).readonly(true);
        assert!(DiscourageImplicitMeasures.apply(&mut session).is_err());
        assert!(!session.model().discourages_implicit_measures());
    }
}
