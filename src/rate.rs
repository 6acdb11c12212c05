/// 時給の解決に利用する候補。
///
/// データ層がtask → project → clientの順に辿って組み立て、
/// 設定のデフォルト時給を`fallback_rate`として呼び出し側が付け加える。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RateContext {
    pub task_rate: Option<f64>,
    pub project_rate: Option<f64>,
    pub client_rate: Option<f64>,
    pub fallback_rate: Option<f64>,
}

impl RateContext {
    /// `fallback_rate`を設定した`RateContext`を返す。
    pub fn with_fallback(self, fallback_rate: Option<f64>) -> Self {
        Self {
            fallback_rate,
            ..self
        }
    }

    /// 優先度の高い順に候補を返す。
    fn candidates(&self) -> [(RateSource, Option<f64>); 4] {
        [
            (RateSource::Task, self.task_rate),
            (RateSource::Project, self.project_rate),
            (RateSource::Client, self.client_rate),
            (RateSource::Fallback, self.fallback_rate),
        ]
    }
}

/// 採用された時給の出どころ。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateSource {
    Task,
    Project,
    Client,
    Fallback,
}

impl RateSource {
    pub fn label(&self) -> &'static str {
        match self {
            RateSource::Task => "task",
            RateSource::Project => "project",
            RateSource::Client => "client",
            RateSource::Fallback => "default",
        }
    }
}

/// 解決された時給。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedRate {
    pub rate: f64,
    pub source: RateSource,
}

/// 最初に見つかった時給を出どころと合わせて返す。
///
/// 全ての候補が`None`の場合は`None`を返す。呼び出し側は0円ではなく「請求不可」として扱う。
pub fn resolve_rate_with_source(context: &RateContext) -> Option<ResolvedRate> {
    context
        .candidates()
        .into_iter()
        .find_map(|(source, rate)| rate.map(|rate| ResolvedRate { rate, source }))
}

/// task, project, client, デフォルトの順で最初に見つかった時給を返す。
pub fn resolve_rate(context: &RateContext) -> Option<f64> {
    resolve_rate_with_source(context).map(|resolved| resolved.rate)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{resolve_rate, resolve_rate_with_source, RateContext, RateSource};

    #[rstest]
    #[case::task(Some(10.0), Some(20.0), Some(30.0), None, Some(10.0))]
    #[case::project(None, Some(20.0), Some(30.0), None, Some(20.0))]
    #[case::client(None, None, Some(30.0), None, Some(30.0))]
    #[case::fallback(None, None, None, Some(40.0), Some(40.0))]
    #[case::nothing(None, None, None, None, None)]
    #[case::zero_rate_is_a_rate(Some(0.0), Some(20.0), None, None, Some(0.0))]
    #[case::fallback_loses(None, Some(20.0), None, Some(40.0), Some(20.0))]
    fn test_resolve_rate(
        #[case] task_rate: Option<f64>,
        #[case] project_rate: Option<f64>,
        #[case] client_rate: Option<f64>,
        #[case] fallback_rate: Option<f64>,
        #[case] expected: Option<f64>,
    ) {
        let context = RateContext {
            task_rate,
            project_rate,
            client_rate,
            fallback_rate,
        };

        assert_eq!(resolve_rate(&context), expected);
    }

    #[test]
    fn test_resolve_rate_with_source() {
        let context = RateContext {
            project_rate: Some(20.0),
            client_rate: Some(30.0),
            ..Default::default()
        }
        .with_fallback(Some(5.0));

        let resolved = resolve_rate_with_source(&context).unwrap();

        assert_eq!(resolved.rate, 20.0);
        assert_eq!(resolved.source, RateSource::Project);
        assert_eq!(
            resolve_rate_with_source(&RateContext::default().with_fallback(Some(5.0)))
                .unwrap()
                .source,
            RateSource::Fallback
        );
    }
}
