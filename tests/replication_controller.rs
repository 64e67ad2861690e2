//! End-to-end tests for the ReplicationController document shape, mirrored
//! against what the apiserver accepts for a freshly created controller.
use std::collections::BTreeMap;

use k8s_models::model::{Container, Pod, ReplicationController};
use rstest::rstest;
use serde_json::Value;

fn object(value: &Value) -> &serde_json::Map<String, Value> {
    value.as_object().expect("expected a JSON object")
}

#[test]
fn fresh_controller_document_shape() {
    let rc = ReplicationController::new("yomama", 0).unwrap();
    let document = rc.to_document().unwrap();

    let root = object(&document);
    assert_eq!(root.len(), 4);
    for key in ["apiVersion", "kind", "metadata", "spec"] {
        assert!(root.contains_key(key), "missing {key}");
    }
    assert_eq!(document["kind"], "ReplicationController");
    assert_eq!(document["apiVersion"], "v1");

    let metadata = object(&document["metadata"]);
    assert_eq!(metadata.len(), 3);
    assert_eq!(document["metadata"]["name"], "yomama");
    assert_eq!(document["metadata"]["namespace"], "default");
    let labels = object(&document["metadata"]["labels"]);
    assert_eq!(labels.len(), 1);
    assert_eq!(document["metadata"]["labels"]["name"], "yomama");

    let spec = object(&document["spec"]);
    assert_eq!(spec.len(), 3);
    assert_eq!(document["spec"]["replicas"], 0);

    let selector = object(&document["spec"]["selector"]);
    assert_eq!(selector.len(), 2);
    assert_eq!(document["spec"]["selector"]["name"], "yomama");
    assert!(document["spec"]["selector"]["rc_version"].is_string());

    let template = object(&document["spec"]["template"]);
    assert_eq!(template.len(), 2);

    let template_labels = object(&document["spec"]["template"]["metadata"]["labels"]);
    assert_eq!(template_labels.len(), 2);
    assert_eq!(
        document["spec"]["template"]["metadata"]["labels"]["rc_version"],
        document["spec"]["selector"]["rc_version"]
    );

    let template_spec = object(&document["spec"]["template"]["spec"]);
    assert_eq!(template_spec.len(), 4);
    assert_eq!(document["spec"]["template"]["spec"]["containers"], Value::Array(vec![]));
    assert_eq!(document["spec"]["template"]["spec"]["volumes"], Value::Array(vec![]));
    assert_eq!(document["spec"]["template"]["spec"]["dnsPolicy"], "Default");
    assert_eq!(document["spec"]["template"]["spec"]["restartPolicy"], "Always");
}

#[test]
fn controller_round_trip_is_idempotent() {
    let mut rc = ReplicationController::with_image("web", "nginx", 3).unwrap();
    rc.add_annotation("owner", "team a")
        .unwrap()
        .add_pod_annotation("sidecar.example.com/inject", "true")
        .unwrap();

    let document = rc.to_document().unwrap();
    let loaded = ReplicationController::from_document(document.clone()).unwrap();

    assert_eq!(loaded, rc);
    assert_eq!(loaded.to_document().unwrap(), document);
}

#[test]
fn annotations_land_on_the_right_subtree() {
    let mut rc = ReplicationController::new("yorc", 0).unwrap();
    rc.add_annotation("yokey", "yovalue").unwrap();

    let document = rc.to_document().unwrap();
    assert_eq!(document["metadata"]["annotations"]["yokey"], "yovalue");
    assert!(document["spec"]["template"]["metadata"]
        .get("annotations")
        .is_none());

    rc.add_pod_annotation("podkey", "podvalue").unwrap();
    let document = rc.to_document().unwrap();
    assert_eq!(
        document["spec"]["template"]["metadata"]["annotations"]["podkey"],
        "podvalue"
    );
    assert!(object(&document["metadata"]["annotations"])
        .get("podkey")
        .is_none());
}

#[rstest]
#[case::empty_key("", "value")]
#[case::spaced_key("yo key", "value")]
#[case::nested_key("a/b/c", "value")]
#[case::bad_value("yokey", "-leading-dash-is-invalid-for-labels")]
fn invalid_label_pairs_are_rejected_by_both_families(#[case] key: &str, #[case] value: &str) {
    let mut rc = ReplicationController::new("yorc", 0).unwrap();

    rc.add_label(key, value).unwrap_err();
    rc.add_pod_label(key, value).unwrap_err();

    let document = rc.to_document().unwrap();
    assert_eq!(object(&document["metadata"]["labels"]).len(), 1);
    assert_eq!(
        object(&document["spec"]["template"]["metadata"]["labels"]).len(),
        2
    );
}

#[test]
fn whole_map_setters() {
    let mut rc = ReplicationController::new("yorc", 2).unwrap();

    let labels = BTreeMap::from([
        ("name".to_owned(), "yorc".to_owned()),
        ("env".to_owned(), "staging".to_owned()),
    ]);
    rc.set_labels(labels.clone()).unwrap();
    assert_eq!(rc.get_labels(), Some(&labels));

    let annotations = BTreeMap::from([("note".to_owned(), "free form value".to_owned())]);
    rc.set_pod_annotations(annotations.clone()).unwrap();
    assert_eq!(rc.get_pod_annotations(), Some(&annotations));

    // the pod labels were not disturbed by either setter
    assert_eq!(rc.get_pod_label("name"), Some("yorc"));
}

#[test]
fn pod_document_scenario() {
    let pod = Pod::with_image("web", "nginx").unwrap();
    let document = pod.to_document().unwrap();

    assert_eq!(document["kind"], "Pod");
    let containers = document["spec"]["containers"].as_array().unwrap();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0]["name"], "web");
    assert_eq!(containers[0]["image"], "nginx");
    assert_eq!(document["spec"]["dnsPolicy"], "Default");
}

#[test]
fn containers_added_to_template_appear_in_document() {
    let mut rc = ReplicationController::new("multi", 1).unwrap();
    rc.add_container(Container::with_image("app", "app:v1").unwrap())
        .add_container(Container::with_image("metrics", "exporter:v2").unwrap());

    let document = rc.to_document().unwrap();
    let containers = document["spec"]["template"]["spec"]["containers"]
        .as_array()
        .unwrap();
    assert_eq!(containers.len(), 2);
    assert_eq!(containers[0]["name"], "app");
    assert_eq!(containers[1]["name"], "metrics");
}
