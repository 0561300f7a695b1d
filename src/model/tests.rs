use super::*;

#[derive(Debug, serde::Deserialize)]
struct ModeHolder {
    #[serde(default)]
    debug: DebugMode,
}

fn parse_mode(json: &str) -> Result<DebugMode, String> {
    serde_json::from_str::<ModeHolder>(json)
        .map(|holder| holder.debug)
        .map_err(|err| format!("parse failed: {}", err))
}

#[test]
fn ensure_id_generates_once() -> Result<(), String> {
    let mut api = ApiDefinition::new("login", HttpMethod::Post, "http://localhost/login");
    if !api.id.is_unassigned() {
        return Err("New definition should start unassigned".to_owned());
    }
    let first = api.ensure_id();
    if first.is_unassigned() {
        return Err("ensure_id returned nil".to_owned());
    }
    let second = api.ensure_id();
    if first != second || api.id != first {
        return Err(format!("Identity changed: {} vs {}", first, second));
    }
    Ok(())
}

#[test]
fn ensure_id_keeps_assigned_identity() -> Result<(), String> {
    let preset = ApiId::generate();
    let mut api = ApiDefinition {
        id: preset,
        ..ApiDefinition::default()
    };
    if api.ensure_id() != preset {
        return Err("Preset identity was replaced".to_owned());
    }
    Ok(())
}

#[test]
fn debug_mode_defaults_to_off() -> Result<(), String> {
    for (input, expected) in [
        (r#"{}"#, DebugMode::Off),
        (r#"{"debug":""}"#, DebugMode::Off),
        (r#"{"debug":"stop"}"#, DebugMode::Off),
        (r#"{"debug":"all"}"#, DebugMode::All),
        (r#"{"debug":"only_success"}"#, DebugMode::OnlySuccess),
        (r#"{"debug":"only_error"}"#, DebugMode::OnlyError),
    ] {
        let mode = parse_mode(input)?;
        if mode != expected {
            return Err(format!("{} parsed as {:?}", input, mode));
        }
    }
    Ok(())
}

#[test]
fn key_value_enabled_by_default() -> Result<(), String> {
    let pair: KeyValue = serde_json::from_str(r#"{"key":"token","value":"abc"}"#)
        .map_err(|err| format!("parse failed: {}", err))?;
    if !pair.enabled {
        return Err("Expected pair to be enabled".to_owned());
    }
    Ok(())
}

#[test]
fn request_body_parses_tagged_modes() -> Result<(), String> {
    let body: RequestBody = serde_json::from_str(r#"{"mode":"raw","value":"a=1"}"#)
        .map_err(|err| format!("parse failed: {}", err))?;
    if body != RequestBody::Raw("a=1".to_owned()) {
        return Err(format!("Unexpected body: {:?}", body));
    }
    let none: RequestBody = serde_json::from_str(r#"{"mode":"none"}"#)
        .map_err(|err| format!("parse failed: {}", err))?;
    if none != RequestBody::None {
        return Err(format!("Unexpected body: {:?}", none));
    }
    Ok(())
}

#[test]
fn ensure_transport_fills_defaults() -> Result<(), String> {
    let mut api = ApiDefinition::default();
    let options = api.ensure_transport().clone();
    if options != TransportOptions::default() {
        return Err("Expected default transport options".to_owned());
    }
    if api.request.transport.is_none() {
        return Err("Defaults were not stored on the definition".to_owned());
    }
    Ok(())
}
