use logcluster::catalog::{CatalogEntry, ClusterCatalog};
use logcluster::template::VariableTree;
use logcluster::{build_catalog, build_index, extract_variables, match_line, ClusterError, ClusterOpts};

fn ssh_catalog() -> ClusterCatalog {
    let lines = ["ssh 10.0.0.1 connect", "ssh 10.0.0.2 connect", "ssh 10.0.0.1 disconnect"];
    build_catalog(&lines, None, &ClusterOpts::default()).unwrap()
}

fn entry(line_length: usize) -> CatalogEntry {
    CatalogEntry { variables: VariableTree::new(), total_lines: 1, line_length }
}

#[test]
fn matches_unseen_ip_to_connect_template() {
    let index = build_index(&ssh_catalog());
    let template = match_line(&index, "ssh 10.0.0.9 connect").expect("should match");
    assert_eq!(template, "ssh *HVRY% connect");
    assert_eq!(extract_variables("ssh 10.0.0.9 connect", &template).unwrap(), vec!["10.0.0.9"]);
}

#[test]
fn unknown_length_or_token_is_not_found() {
    let index = build_index(&ssh_catalog());
    assert_eq!(match_line(&index, "ssh 10.0.0.9"), None);
    assert_eq!(match_line(&index, "ftp 10.0.0.9 connect"), None);
    assert_eq!(match_line(&index, "ssh 10.0.0.9 reset"), None);
    assert_eq!(match_line(&index, ""), None);
}

#[test]
fn literal_child_is_preferred_over_marker() {
    let mut catalog = ClusterCatalog::new();
    catalog.insert("job *HVRY% done".into(), entry(3)).unwrap();
    catalog.insert("job cleanup done".into(), entry(3)).unwrap();
    let index = build_index(&catalog);
    assert_eq!(index.match_line("job cleanup done").as_deref(), Some("job cleanup done"));
    assert_eq!(index.match_line("job 42 done").as_deref(), Some("job *HVRY% done"));
}

#[test]
fn falls_back_to_marker_when_literal_branch_dead_ends() {
    let mut catalog = ClusterCatalog::new();
    catalog.insert("x *HVRY% z".into(), entry(3)).unwrap();
    catalog.insert("x y w".into(), entry(3)).unwrap();
    let index = build_index(&catalog);
    assert_eq!(index.match_line("x y z").as_deref(), Some("x *HVRY% z"));
    assert_eq!(index.match_line("x y w").as_deref(), Some("x y w"));
    assert_eq!(index.match_line("x q w"), None);
}

#[test]
fn very_long_templates_match_without_deep_recursion() {
    let width = 20_000;
    let template: Vec<&str> = (0..width).map(|i| if i % 3 == 2 { logcluster::VAR_TOKEN } else { "k" }).collect();
    let template = template.join(" ");
    let mut catalog = ClusterCatalog::new();
    catalog.insert(template.clone(), entry(width)).unwrap();
    // literal where the line has "v2", but a different last token: the walk
    // follows it to the end and must unwind the whole chain
    let mut near_miss: Vec<&str> = template.split_whitespace().collect();
    near_miss[2] = "v2";
    near_miss[width - 1] = "q";
    catalog.insert(near_miss.join(" "), entry(width)).unwrap();
    let index = build_index(&catalog);
    assert_eq!(index.template_count(), 2);

    let line: Vec<String> = (0..width).map(|i| if i % 3 == 2 { format!("v{i}") } else { "k".to_string() }).collect();
    let line = line.join(" ");
    assert_eq!(index.match_line(&line).as_deref(), Some(template.as_str()));
    let vars = extract_variables(&line, &template).unwrap();
    assert_eq!(vars.len(), width / 3);
    assert_eq!(vars[0], "v2");

    let mut miss: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
    miss[0] = "z".to_string();
    assert_eq!(index.match_line(&miss.join(" ")), None);
}

#[test]
fn building_twice_yields_identical_trees() {
    let catalog = ssh_catalog();
    let a = build_index(&catalog);
    let b = build_index(&catalog);
    assert_eq!(a, b);
    assert_eq!(a.template_count(), catalog.len());
    assert_eq!(a.lengths().collect::<Vec<_>>(), vec![3]);
}

#[test]
fn every_training_line_matches_and_extracts() {
    let lines: Vec<String> = (0..60)
        .map(|i| match i % 4 {
            0 => format!("conn {} opened from 10.0.{}.{}", i, i % 3, i),
            1 => format!("conn {} closed", i),
            2 => format!("cache {} {}", ["hit", "miss"][i % 2], i % 5),
            _ => format!("tick {}", i),
        })
        .collect();
    let catalog = build_catalog(&lines, None, &ClusterOpts::default()).unwrap();
    let index = build_index(&catalog);
    for line in &lines {
        let template = index.match_line(line).unwrap_or_else(|| panic!("no template for {line}"));
        let entry = catalog.get(&template).expect("template in catalog");
        assert_eq!(entry.line_length, line.split_whitespace().count());
        let vars = extract_variables(line, &template).expect("same shape");
        assert_eq!(vars.len(), template.split_whitespace().filter(|t| *t == logcluster::VAR_TOKEN).count());
    }
}

#[test]
fn extract_rejects_shape_mismatch() {
    let err = extract_variables("ssh 10.0.0.9", "ssh *HVRY% connect").unwrap_err();
    match err {
        ClusterError::ShapeMismatch { expected, actual } => {
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn extracts_multiple_variables_left_to_right() {
    let vars = extract_variables("user bob from 10.1.1.1 port 22", "user *HVRY% from *HVRY% port *HVRY%").unwrap();
    assert_eq!(vars, vec!["bob", "10.1.1.1", "22"]);
    assert!(extract_variables("start", "start").unwrap().is_empty());
}
