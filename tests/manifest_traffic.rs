use preview_cloudrun::manifest::{parse_service_manifest, ManifestError, TrafficTarget};

const SERVICE_YAML: &str = r#"
apiVersion: serving.knative.dev/v1
kind: Service
metadata:
  annotations:
    run.googleapis.com/client-name: cloud-console
    run.googleapis.com/ingress: all
    run.googleapis.com/ingress-status: all
  creationTimestamp: '2022-02-28T08:36:32.176035Z'
  generation: 153
  labels:
    cloud.googleapis.com/location: asia-northeast1
  name: helloworld
  namespace: 'xxxxxxxxxx'
  resourceVersion: AAX4CQw8EkQ
  selfLink: /apis/serving.knative.dev/v1/namespaces/xxxxxxxxxx/services/helloworld
  uid: d2023724-21df-8544ff6b7b47
spec:
  template:
    metadata:
      annotations:
        autoscaling.knative.dev/maxScale: '1'
      labels:
      name: helloworld-v001-aa3e4b2
    spec:
      containerConcurrency: 80
      containers:
      - args:
        - server
        image: gcr.io/cloudrun/hello:latest
        ports:
        - containerPort: 9085
          name: http1
        resources:
          limits:
            cpu: 1000m
            memory: 128Mi
      serviceAccountName: xxxxxxxxxx-compute@developer.gserviceaccount.com
      timeoutSeconds: 300
  traffic:
  - percent: 100
    revisionName: helloworld-v001-aa3e4b2
status:
  observedGeneration: 154
  conditions:
  - type: Ready
    status: 'True'
    lastTransitionTime: '2023-04-03T06:14:46.897608Z'
  latestReadyRevisionName: helloworld-v001-aa3e4b2
  latestCreatedRevisionName: helloworld-v001-aa3e4b2
  traffic:
  - revisionName: helloworld-v001-aa3e4b2
    percent: 100
  - revisionName: helloworld-v001-bbhf45qc
    tag: pr-1
    url: https://pr-1---helloworld-amwk6cvjiq-an.a.run.app
  url: https://helloworld-amwk6cvjiq-an.a.run.app
  address:
    url: helloworld-amwk6cvjiq-an.a.run.app
"#;

#[test]
fn test_reads_fields_verbatim() {
    let manifest = parse_service_manifest(SERVICE_YAML).unwrap();

    assert_eq!(manifest.api_version(), "serving.knative.dev/v1");
    assert_eq!(manifest.service_name(), "helloworld");
    assert_eq!(manifest.image(), "gcr.io/cloudrun/hello:latest");
    assert_eq!(manifest.revision_name(), "helloworld-v001-aa3e4b2");
    assert_eq!(
        manifest.service_url(),
        "https://helloworld-amwk6cvjiq-an.a.run.app"
    );
}

#[test]
fn test_empty_documents_are_parse_errors() {
    for input in ["", "{}", "[]"] {
        assert!(matches!(
            parse_service_manifest(input),
            Err(ManifestError::Parse { .. })
        ));
    }
}

#[test]
fn test_status_traffic_projection() {
    let manifest = parse_service_manifest(SERVICE_YAML).unwrap();
    assert_eq!(
        manifest.traffic(),
        vec![
            TrafficTarget::revision("helloworld-v001-aa3e4b2").with_percent(100),
            TrafficTarget::revision("helloworld-v001-bbhf45qc")
                .with_tag("pr-1")
                .with_url("https://pr-1---helloworld-amwk6cvjiq-an.a.run.app"),
        ]
    );
    assert_eq!(
        manifest.preview_url("pr-1").as_deref(),
        Some("https://pr-1---helloworld-amwk6cvjiq-an.a.run.app")
    );
}

#[test]
fn test_missing_status_traffic_is_empty() {
    let manifest = parse_service_manifest(
        "apiVersion: serving.knative.dev/v1\nkind: Service\nmetadata:\n  name: fresh\n",
    )
    .unwrap();
    assert!(manifest.traffic().is_empty());
    assert!(manifest.spec_traffic().is_empty());
    assert_eq!(manifest.image(), "");
    assert_eq!(manifest.revision_name(), "");
}

#[test]
fn test_preview_traffic_add_then_replace() {
    let mut manifest = parse_service_manifest(SERVICE_YAML).unwrap();

    // add the new tag.
    manifest
        .update_preview_traffic("helloworld-v001-bbhf45q", "pr-1")
        .unwrap();
    assert_eq!(
        manifest.spec_traffic(),
        vec![
            TrafficTarget::revision("helloworld-v001-aa3e4b2").with_percent(100),
            TrafficTarget::revision("helloworld-v001-bbhf45q").with_tag("pr-1"),
        ]
    );

    // move the tag to a newer revision; the old holder has no share left
    // and is dropped.
    manifest
        .update_preview_traffic("helloworld-v001-kfdacf3", "pr-1")
        .unwrap();
    let traffic = manifest.spec_traffic();
    assert_eq!(
        traffic,
        vec![
            TrafficTarget::revision("helloworld-v001-aa3e4b2").with_percent(100),
            TrafficTarget::revision("helloworld-v001-kfdacf3").with_tag("pr-1"),
        ]
    );
    assert_eq!(traffic.iter().filter(|t| t.has_tag("pr-1")).count(), 1);

    // observed traffic is untouched by desired-state mutations
    assert_eq!(manifest.traffic().len(), 2);
}

#[test]
fn test_preview_traffic_serializes_without_empty_members() {
    let mut manifest = parse_service_manifest(SERVICE_YAML).unwrap();
    manifest
        .update_preview_traffic("helloworld-v001-bbhf45q", "pr-1")
        .unwrap();

    let yaml = manifest.to_yaml().unwrap();
    let reparsed = parse_service_manifest(&yaml).unwrap();
    let raw = reparsed.document()["spec"]["traffic"].as_sequence().unwrap();

    assert_eq!(raw.len(), 2);
    assert!(raw[0].get("tag").is_none());
    assert!(raw[1].get("percent").is_none());
    assert!(raw[1].get("url").is_none());
    // untouched parts survive the round trip
    assert_eq!(
        reparsed.document()["metadata"]["annotations"]["run.googleapis.com/ingress"],
        serde_yaml::Value::from("all")
    );
}

#[test]
fn test_remove_tag() {
    let mut manifest = parse_service_manifest(
        r#"
apiVersion: serving.knative.dev/v1
spec:
  traffic:
  - revisionName: r1
    tag: pr-1
  - revisionName: r2
"#,
    )
    .unwrap();

    manifest.remove_tag("pr-1").unwrap();
    assert_eq!(manifest.spec_traffic(), vec![TrafficTarget::revision("r2")]);

    // removing a tag nobody holds is a no-op
    manifest.remove_tag("pr-9").unwrap();
    assert_eq!(manifest.spec_traffic(), vec![TrafficTarget::revision("r2")]);
}

#[test]
fn test_traffic_mutators_require_spec_traffic() {
    let mut manifest =
        parse_service_manifest("apiVersion: serving.knative.dev/v1\nspec:\n  template: {}\n")
            .unwrap();

    assert!(matches!(
        manifest.update_preview_traffic("r2", "pr-1"),
        Err(ManifestError::MissingField { .. })
    ));
    assert!(matches!(
        manifest.remove_tag("pr-1"),
        Err(ManifestError::MissingField { .. })
    ));
}

#[test]
fn test_field_updates() {
    let mut manifest = parse_service_manifest(SERVICE_YAML).unwrap();
    let traffic_before = manifest.spec_traffic();

    manifest.update_revision_name("helloworld-pr1").unwrap();
    manifest.update_image("gcr.io/cloudrun/hello:v2").unwrap();

    assert_eq!(manifest.revision_name(), "helloworld-pr1");
    assert_eq!(manifest.image(), "gcr.io/cloudrun/hello:v2");
    assert_eq!(manifest.spec_traffic(), traffic_before);
    assert_eq!(manifest.service_name(), "helloworld");
    assert_eq!(
        manifest.document()["spec"]["template"]["spec"]["containers"][0]["args"][0],
        serde_yaml::Value::from("server")
    );
}

#[test]
fn test_field_updates_require_current_values() {
    let mut manifest = parse_service_manifest(
        "apiVersion: serving.knative.dev/v1\nspec:\n  template:\n    spec:\n      containers: []\n  traffic: []\n",
    )
    .unwrap();

    assert!(matches!(
        manifest.update_revision_name("r2"),
        Err(ManifestError::NotFound { .. })
    ));
    assert!(matches!(
        manifest.update_image("gcr.io/x:y"),
        Err(ManifestError::NotFound { .. })
    ));
}

#[test]
fn test_preview_traffic_keeps_one_holder_per_tag() {
    let mut manifest = parse_service_manifest(
        r#"
apiVersion: serving.knative.dev/v1
spec:
  template:
    metadata:
      name: r1
  traffic:
  - percent: 90
    revisionName: r1
  - percent: 10
    revisionName: r2
    tag: pr-1
  - percent: 0.4
    revisionName: r0
"#,
    )
    .unwrap();

    manifest.update_preview_traffic("r3", "pr-1").unwrap();

    assert_eq!(
        manifest.spec_traffic(),
        vec![
            TrafficTarget::revision("r1").with_percent(90),
            TrafficTarget::revision("r2").with_percent(10),
            TrafficTarget::revision("r3").with_tag("pr-1"),
        ]
    );
    assert_eq!(manifest.revisions_for_tag("pr-1"), vec!["r3"]);
    assert!(!manifest.to_yaml().unwrap().contains("percent: 0"));
}
