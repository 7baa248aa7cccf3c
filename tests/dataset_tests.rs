//! Integration tests for reading, editing and writing datasets

use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use ecospold::{
    save, to_json, Config, Context, Dataset, Error, Generation, Loader, RegistryCode, SaveOptions,
    Value,
};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn context() -> Arc<Context> {
    Arc::new(Context::embedded().unwrap())
}

fn load(name: &str, generation: Generation) -> Dataset {
    Loader::new(context(), generation).load(fixture(name)).unwrap()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_v1_fixture_is_valid() {
    let ds = load("v1/electricity.xml", Generation::V1);
    assert!(ds.is_valid(), "{:?}", ds.issues());
}

#[test]
fn test_v2_fixture_is_valid() {
    let ds = load("v2/steel.spold", Generation::V2);
    assert!(ds.is_valid(), "{:?}", ds.issues());
}

#[test]
fn test_wrong_generation_is_reported() {
    let ds = load("v1/electricity.xml", Generation::V2);
    assert!(!ds.is_valid());
    assert_eq!(ds.issues().len(), 1);
    assert!(ds.issues()[0].message.contains("EcoSpold02"));
}

#[test]
fn test_navigate_v1() {
    let ds = load("v1/electricity.xml", Generation::V1);
    let dataset = ds.root().children("dataset").unwrap().remove(0);
    assert_eq!(dataset.get_i64("number").unwrap(), Some(1));

    let reference = dataset
        .child("metaInformation")
        .unwrap()
        .unwrap()
        .child("processInformation")
        .unwrap()
        .unwrap()
        .child("referenceFunction")
        .unwrap()
        .unwrap();
    assert_eq!(
        reference.get_str("name").unwrap().as_deref(),
        Some("electricity, hydropower, at power plant")
    );
    assert_eq!(reference.get_f64("amount").unwrap(), Some(1.0));
    assert_eq!(reference.get_bool("datasetRelatesToProduct").unwrap(), Some(true));
    assert_eq!(
        reference.get_list("synonym").unwrap(),
        vec![Value::from("hydroelectricity"), Value::from("water power")]
    );

    let exchanges = dataset
        .child("flowData")
        .unwrap()
        .unwrap()
        .children("exchange")
        .unwrap();
    assert_eq!(exchanges.len(), 3);
    assert_eq!(exchanges[1].get_label("uncertaintyType").unwrap(), Some("lognormal"));
    assert_eq!(exchanges[1].active_choice("groups").unwrap(), Some("inputGroup"));
}

#[test]
fn test_navigate_v2() {
    let ds = load("v2/steel.spold", Generation::V2);
    let activity_dataset = ds.root().child("activityDataset").unwrap().unwrap();
    let activity = activity_dataset
        .child("activityDescription")
        .unwrap()
        .unwrap()
        .child("activity")
        .unwrap()
        .unwrap();

    assert_eq!(
        activity.get_str("id").unwrap().as_deref(),
        Some("2e2c8f5a-3c1d-4b5e-9f0a-1b2c3d4e5f60")
    );
    assert_eq!(activity.get_label("type").unwrap(), Some("Unit process"));
    // inheritanceDepth is absent and falls back to its schema default
    assert_eq!(activity.get_i64("inheritanceDepth").unwrap(), Some(0));

    let comment = activity.child("generalComment").unwrap().unwrap();
    assert_eq!(comment.get_list("text").unwrap().len(), 2);

    let elementary = activity_dataset
        .child("flowData")
        .unwrap()
        .unwrap()
        .children("elementaryExchange")
        .unwrap()
        .remove(0);
    let uncertainty = elementary.children("uncertainty").unwrap().remove(0);
    assert_eq!(uncertainty.active_choice("distribution").unwrap(), Some("lognormal"));
    assert_eq!(
        elementary.get("casNumber").unwrap(),
        Some(Value::RegistryCode(RegistryCode::parse("124-38-9").unwrap()))
    );
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_round_trip_preserves_content() {
    for (name, generation) in [
        ("v1/electricity.xml", Generation::V1),
        ("v2/steel.spold", Generation::V2),
    ] {
        let ds = load(name, generation);
        let bytes = ecospold::serializer::to_bytes(&ds, &SaveOptions::default()).unwrap();

        let reloaded = Loader::new(context(), generation)
            .load_bytes(name, &bytes)
            .unwrap();
        assert!(reloaded.is_valid(), "{}: {:?}", name, reloaded.issues());
        assert_eq!(to_json(&reloaded.root()), to_json(&ds.root()));
        assert_eq!(
            ecospold::serializer::to_bytes(&reloaded, &SaveOptions::default()).unwrap(),
            bytes
        );
    }
}

#[test]
fn test_save_keeps_namespaces() {
    let ds = load("v1/electricity.xml", Generation::V1);
    let dir = tempfile::TempDir::new().unwrap();
    let target = dir.path().join("electricity.xml");
    save(&ds, &target, &SaveOptions::default()).unwrap();

    let text = std::fs::read_to_string(&target).unwrap();
    assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(text.contains(r#"xmlns="http://www.EcoInvent.org/EcoSpold01""#));
    assert!(text.contains(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#));
}

#[test]
fn test_save_refuses_missing_directory() {
    let ds = load("v1/electricity.xml", Generation::V1);
    let dir = tempfile::TempDir::new().unwrap();
    let target = dir.path().join("nested").join("out.xml");

    assert!(matches!(
        save(&ds, &target, &SaveOptions::default()),
        Err(Error::Io(_))
    ));
    save(&ds, &target, &SaveOptions::new().with_create_dirs(true)).unwrap();
    assert!(target.exists());
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_default_fallback_order() {
    let ds = load("batch/01_cement.xml", Generation::V1);
    let dataset = ds.root().children("dataset").unwrap().remove(0);
    let info = dataset
        .child("metaInformation")
        .unwrap()
        .unwrap()
        .child("processInformation")
        .unwrap()
        .unwrap()
        .child("dataSetInformation")
        .unwrap()
        .unwrap();

    // Registry default
    assert_eq!(dataset.get_str("validUnits").unwrap().as_deref(), Some("Units.xml"));
    // Schema default
    assert_eq!(info.get_str("languageCode").unwrap().as_deref(), Some("en"));
    // Neither
    assert_eq!(dataset.get_str("generator").unwrap(), None);
    // Nothing was written by reading
    assert!(!dataset.is_present("validUnits").unwrap());
}

#[test]
fn test_registry_overrides_schema_default() {
    let config = Config::from_toml_str(
        r#"
        [defaults.DataSetInformation]
        languageCode = "fr"
        "#,
    )
    .unwrap();
    let ctx = Arc::new(Context::new(config).unwrap());
    let ds = Loader::new(ctx, Generation::V1)
        .load(fixture("batch/01_cement.xml"))
        .unwrap();

    let info = ds
        .root()
        .children("dataset")
        .unwrap()
        .remove(0)
        .child("metaInformation")
        .unwrap()
        .unwrap()
        .child("processInformation")
        .unwrap()
        .unwrap()
        .child("dataSetInformation")
        .unwrap()
        .unwrap();
    assert_eq!(info.get_str("languageCode").unwrap().as_deref(), Some("fr"));
}

#[test]
fn test_fill_defaults_writes_registry_values_once() {
    let mut ds = load("batch/01_cement.xml", Generation::V1);
    let written = ds.fill_defaults().unwrap();
    // validCompanyCodes, validRegionalCodes, validCategories, validUnits,
    // generator and the exchange's uncertaintyType
    assert_eq!(written, 6);
    assert_eq!(ds.fill_defaults().unwrap(), 0);

    let dataset = ds.root().children("dataset").unwrap().remove(0);
    assert!(dataset.is_present("validUnits").unwrap());
    assert_eq!(
        dataset.get_str("generator").unwrap(),
        Some(ecospold::defaults::generator_name())
    );
    assert!(ds.validate().is_empty());
}

fn time_period(ds: &Dataset) -> ecospold::DataObject<'_> {
    ds.root()
        .children("dataset")
        .unwrap()
        .remove(0)
        .child("metaInformation")
        .unwrap()
        .unwrap()
        .child("processInformation")
        .unwrap()
        .unwrap()
        .child("timePeriod")
        .unwrap()
        .unwrap()
}

fn load_with_start_date_default() -> Dataset {
    let config = Config::from_toml_str(
        r#"
        [defaults.TimePeriod]
        startDate = "1999-01-01"
        "#,
    )
    .unwrap();
    Loader::new(Arc::new(Context::new(config).unwrap()), Generation::V1)
        .load(fixture("v1/electricity.xml"))
        .unwrap()
}

#[test]
fn test_choice_default_not_read_while_other_member_present() {
    let ds = load_with_start_date_default();
    let period = time_period(&ds);

    assert_eq!(period.active_choice("start").unwrap(), Some("startYear"));
    assert_eq!(period.get_i64("startYear").unwrap(), Some(2000));
    assert_eq!(period.get("startDate").unwrap(), None);
}

#[test]
fn test_fill_defaults_keeps_present_choice_member() {
    let mut ds = load_with_start_date_default();
    assert_eq!(ds.fill_defaults().unwrap(), 0);

    let period = time_period(&ds);
    assert_eq!(period.get_i64("startYear").unwrap(), Some(2000));
    assert!(!period.is_present("startDate").unwrap());
    assert!(ds.validate().is_empty());
}

#[test]
fn test_fill_defaults_fills_empty_choice_group() {
    let mut ds = load_with_start_date_default();
    {
        let mut root = ds.root_mut();
        let mut dataset = root.child_mut("dataset").unwrap().unwrap();
        let mut meta = dataset.child_mut("metaInformation").unwrap().unwrap();
        let mut process = meta.child_mut("processInformation").unwrap().unwrap();
        let mut period = process.child_mut("timePeriod").unwrap().unwrap();
        period.unset("startYear").unwrap();
    }
    assert_eq!(ds.fill_defaults().unwrap(), 1);

    let period = time_period(&ds);
    assert_eq!(period.active_choice("start").unwrap(), Some("startDate"));
    assert_eq!(
        period.get("startDate").unwrap().map(|v| v.to_string()),
        Some("1999-01-01".to_string())
    );
    assert!(ds.validate().is_empty());
}

// ============================================================================
// Editing
// ============================================================================

#[test]
fn test_registry_code_check_digit() {
    let mut ds = load("v1/electricity.xml", Generation::V1);
    let mut root = ds.root_mut();
    let mut dataset = root.child_mut("dataset").unwrap().unwrap();
    let mut flow = dataset.child_mut("flowData").unwrap().unwrap();
    let mut water = flow.child_at_mut("exchange", 1).unwrap().unwrap();

    let before = water.get("CASNumber").unwrap();
    let err = water.set_raw("CASNumber", "7732-18-4").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(water.get("CASNumber").unwrap(), before);

    water.set_raw("CASNumber", "0007732-18-5").unwrap();
    assert_eq!(
        water.get("CASNumber").unwrap().map(|v| v.to_string()),
        Some("7732-18-5".to_string())
    );
}

#[test]
fn test_choice_exclusivity() {
    let mut ds = load("v1/electricity.xml", Generation::V1);
    {
        let mut root = ds.root_mut();
        let mut dataset = root.child_mut("dataset").unwrap().unwrap();
        let mut flow = dataset.child_mut("flowData").unwrap().unwrap();
        let mut water = flow.child_at_mut("exchange", 1).unwrap().unwrap();
        water.set_list("outputGroup", [4i64]).unwrap();

        let view = water.as_ref();
        assert_eq!(view.active_choice("groups").unwrap(), Some("outputGroup"));
        assert!(!view.is_present("inputGroup").unwrap());
    }
    assert!(ds.validate().is_empty());
}

#[test]
fn test_unknown_field() {
    let mut ds = load("v2/steel.spold", Generation::V2);
    assert!(matches!(
        ds.root().get("number"),
        Err(Error::UnknownField { .. })
    ));
    assert!(matches!(
        ds.root_mut().set("number", 3i64),
        Err(Error::UnknownField { .. })
    ));
}

#[test]
fn test_build_dataset_from_scratch() {
    let mut ds = Dataset::new(context(), Generation::V1).unwrap();
    {
        let mut root = ds.root_mut();
        let mut dataset = root.append("dataset").unwrap();
        dataset.set("number", 7i64).unwrap();

        let mut meta = dataset.ensure_child("metaInformation").unwrap();
        let mut process = meta.ensure_child("processInformation").unwrap();
        {
            let mut info = process.ensure_child("dataSetInformation").unwrap();
            info.set("type", 1i64).unwrap();
            info.set("impactAssessmentResult", false).unwrap();
            info.set_raw("timestamp", "2024-05-01T12:00:00").unwrap();
            info.set("version", 1.0).unwrap();
            info.set("internalVersion", 1.0).unwrap();
        }
        // Inserted before dataSetInformation to keep schema order
        let mut reference = process.ensure_child("referenceFunction").unwrap();
        reference.set("name", "clinker, at plant").unwrap();
        reference.set("amount", 1.0).unwrap();
        reference.set("unit", "kg").unwrap();
    }
    let issues = ds.validate();
    // Reported by the XML Schema and by the element tables
    assert!(!issues.is_empty());
    assert!(
        issues.iter().all(|i| i.message.contains("flowData")),
        "{:?}",
        issues
    );

    ds.root_mut()
        .child_mut("dataset")
        .unwrap()
        .unwrap()
        .ensure_child("flowData")
        .unwrap();
    let issues = ds.validate();
    assert!(issues.is_empty(), "{:?}", issues);
}
