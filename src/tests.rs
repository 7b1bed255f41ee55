#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use crate::output::{EventSink, OutputOptions, StdoutSink};
    use crate::session::{Session, SessionOptions, resolve_group};
    use crate::source::fake::{FakeSource, Recorder};
    use crate::types::LogEvent;
    use clap::Parser;
    use std::sync::Arc;

    #[test]
    fn test_cli_parsing_group() {
        let args = vec!["cloudtail", "payments"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.group, Some("payments".to_string()));
        assert_eq!(cli.lines, 10);
        assert_eq!(cli.interval, 3);
        assert!(!cli.follow);
        assert!(cli.pid.is_none());
    }

    #[test]
    fn test_cli_parsing_follow() {
        let args = vec!["cloudtail", "-f", "-s", "5", "-p", "4242", "payments"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.follow);
        assert_eq!(cli.interval, 5);
        assert_eq!(cli.pid, Some(4242));
    }

    #[test]
    fn test_cli_parsing_lines() {
        let args = vec!["cloudtail", "-n", "50", "payments"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.lines, 50);
    }

    #[test]
    fn test_cli_parsing_verbose() {
        let args = vec!["cloudtail", "payments", "-v", "--hide-metadata"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.verbose);
        assert!(cli.hide_metadata);
    }

    #[test]
    fn test_cli_parsing_list_without_group() {
        let args = vec!["cloudtail", "-l"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.list);
        assert!(cli.group.is_none());
    }

    #[test]
    fn test_cli_parsing_aws_options() {
        let args = vec![
            "cloudtail", "--region", "eu-west-1", "--profile", "prod", "-g", "ERROR", "-w", "api",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.region.as_deref(), Some("eu-west-1"));
        assert_eq!(cli.profile.as_deref(), Some("prod"));
        assert_eq!(cli.grep.as_deref(), Some("ERROR"));
        assert!(cli.wait);
    }

    #[test]
    fn test_cli_follow_implies_waiting() {
        let cli = Cli::try_parse_from(vec!["cloudtail", "-f", "payments"]).unwrap();
        assert!(cli.waits_for_group());
        let cli = Cli::try_parse_from(vec!["cloudtail", "-w", "payments"]).unwrap();
        assert!(cli.waits_for_group());
        let cli = Cli::try_parse_from(vec!["cloudtail", "payments"]).unwrap();
        assert!(!cli.waits_for_group());
    }

    #[test]
    fn test_cli_requires_group() {
        assert!(Cli::try_parse_from(vec!["cloudtail"]).is_err());
    }

    #[test]
    fn test_cli_rejects_zero_interval() {
        assert!(Cli::try_parse_from(vec!["cloudtail", "-s", "0", "g"]).is_err());
    }

    #[tokio::test]
    async fn test_resolution_without_groups_fails() {
        let source = FakeSource::default().stream("web-1", &[(1, "boot")]);
        let err = resolve_group(&source, "").await.unwrap_err();
        assert!(matches!(err, crate::TailError::NoMatchingGroup { .. }));
    }

    #[tokio::test]
    async fn test_payments_scenario_end_to_end() {
        let source = Arc::new(
            FakeSource::default()
                .group("/ecs/payments")
                .group("/ecs/orders")
                .stream("web-1", &[(100, "charge accepted"), (300, "refund issued")])
                .stream("web-2", &[(200, "charge declined"), (400, "late")]),
        );

        let group = resolve_group(source.as_ref(), "payments").await.unwrap();
        assert_eq!(group.name, "/ecs/payments");

        let mut sink = StdoutSink::new(Vec::new(), OutputOptions::default());
        sink.group_resolved(&group).unwrap();
        let mut session = Session::new(Arc::clone(&source), group, SessionOptions::default());
        session.dump(3, &mut sink).await.unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let messages: Vec<&str> = out
            .lines()
            .map(|line| line.rsplit(": ").next().unwrap())
            .collect();
        assert_eq!(messages, vec!["charge accepted", "charge declined", "refund issued"]);
    }

    #[tokio::test]
    async fn test_follow_passes_show_each_event_once() {
        let source = Arc::new(FakeSource::default().stream("web-1", &[(1, "boot")]));

        let mut session = Session::new(
            Arc::clone(&source),
            crate::types::LogGroup::named("/ecs/payments"),
            SessionOptions::default(),
        );
        let mut out = Recorder::default();
        session.refresh_streams().await.unwrap();
        session.initial_pass(&mut out).await.unwrap();

        let mut expected = vec![LogEvent::new(1, "boot")];
        for tick in 2..6 {
            source.push_event("web-1", tick, "request served");
            expected.push(LogEvent::new(tick, "request served"));
            session.tick(&mut out).await.unwrap();
            session.tick(&mut out).await.unwrap();
        }
        assert_eq!(out.events, expected);
    }
}
