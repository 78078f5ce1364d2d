use logcluster::catalog::{CatalogEntry, ClusterCatalog};
use logcluster::template::VariableTree;
use logcluster::{build_catalog, ClusterError, ClusterOpts};

fn ssh_catalog() -> ClusterCatalog {
    let lines = ["ssh 10.0.0.1 connect", "ssh 10.0.0.2 connect", "ssh 10.0.0.1 disconnect"];
    build_catalog(&lines, None, &ClusterOpts::default()).unwrap()
}

#[test]
fn serializes_with_vars_total_lines_and_line_len() {
    let catalog = ssh_catalog();
    let v = serde_json::to_value(&catalog).unwrap();
    let connect = &v["ssh *HVRY% connect"];
    assert_eq!(connect["total_lines"], 2);
    assert_eq!(connect["line_len"], 3);
    assert_eq!(connect["vars"][0]["path"][0], "10.0.0.1");
    assert_eq!(connect["vars"][0]["count"], 1);
    assert_eq!(connect["vars"][1]["path"][0], "10.0.0.2");

    let mut buf = Vec::new();
    catalog.to_writer_pretty(&mut buf).unwrap();
    let back = ClusterCatalog::from_reader(buf.as_slice()).unwrap();
    assert_eq!(back, catalog);
}

#[test]
fn wide_templates_survive_a_json_round_trip() {
    let lines: Vec<String> = (0..3)
        .map(|row| {
            let rest: Vec<String> = (1..70).map(|col| format!("v{row}_{col}")).collect();
            format!("trace {}", rest.join(" "))
        })
        .collect();
    let catalog = build_catalog(&lines, None, &ClusterOpts::default()).unwrap();
    assert_eq!(catalog.len(), 1);
    let (template, entry) = catalog.iter().next().unwrap();
    assert_eq!(entry.line_length, 70);
    assert_eq!(template.split_whitespace().filter(|t| *t == logcluster::VAR_TOKEN).count(), 69);

    let mut buf = Vec::new();
    catalog.to_writer_pretty(&mut buf).unwrap();
    let back = ClusterCatalog::from_reader(buf.as_slice()).unwrap();
    assert_eq!(back, catalog);

    let s = logcluster::score(template, &(1..70).map(|col| format!("v1_{col}")).collect::<Vec<_>>(), &back, 3).unwrap();
    assert_eq!(s.variable_probability, Some(1.0 / 3.0));
}

#[test]
fn malformed_catalog_json_is_reported() {
    let err = ClusterCatalog::from_reader(&b"{not json"[..]).unwrap_err();
    assert!(matches!(err, ClusterError::Json(_)));
}

#[test]
fn duplicate_identity_is_rejected() {
    let mut catalog = ClusterCatalog::new();
    let entry = CatalogEntry { variables: VariableTree::new(), total_lines: 1, line_length: 1 };
    catalog.insert("start".into(), entry.clone()).unwrap();
    let err = catalog.insert("start".into(), entry).unwrap_err();
    assert!(matches!(err, ClusterError::DuplicateTemplate(t) if t == "start"));
    assert_eq!(catalog.len(), 1);
}

#[test]
fn summaries_sort_by_count_then_template() {
    let summaries = ssh_catalog().summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].template, "ssh *HVRY% connect");
    assert_eq!(summaries[0].total_lines, 2);
    assert_eq!(summaries[0].variable_count, 1);
    assert_eq!(summaries[0].distinct_leading_values, 2);
    assert_eq!(summaries[1].template, "ssh *HVRY% disconnect");
}

#[test]
fn prior_clusters_retokenize_templates_by_length() {
    let prior = ssh_catalog().prior_clusters();
    assert_eq!(prior.len(), 1);
    let three = prior.get(&3).unwrap();
    assert_eq!(three.len(), 2);
    assert!(three.iter().all(|t| t[1] == logcluster::VAR_TOKEN));
}
