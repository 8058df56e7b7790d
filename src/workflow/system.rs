use anyhow::Result;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::WorkbenchContext;
use crate::assist::Assistant;
use crate::cli::{
    DiscoveryCommand, DiscoverySetArgs, FlagArgs, SimulateArgs, SystemCommand, SystemCreateArgs,
    TestArgs,
};
use crate::discovery::extract_fields;
use crate::error::WorkbenchError;
use crate::model::{non_blank, required, AuthType, FieldFlag, FieldFlagKind, System};
use crate::probe::{run_probe, simulate, ProbeRequest};
use crate::store::newest_first;
use crate::util::{parse_user_json, print_json, read_text_input};

pub(crate) fn run_system(ctx: &WorkbenchContext, command: &SystemCommand) -> Result<()> {
    match command {
        SystemCommand::List => print_json(&newest_first(ctx.store.list::<System>()?)),
        SystemCommand::Create(args) => print_json(&create_system(ctx, args)?),
        SystemCommand::Show(args) => print_json(&ctx.store.require::<System>(&args.id, "System")?),
        SystemCommand::Discovery(command) => run_discovery(ctx, command),
        SystemCommand::Flags(args) => print_json(&json!({ "flags": field_flags(ctx, &args.id)? })),
        SystemCommand::Flag(args) => print_json(&set_field_flag(ctx, args)?),
        SystemCommand::Simulate(args) => run_simulate(ctx, args),
        SystemCommand::Test(args) => run_test(ctx, args),
    }
}

fn create_system(ctx: &WorkbenchContext, args: &SystemCreateArgs) -> Result<System> {
    let missing = || WorkbenchError::Invalid("name and base_url are required".to_string());
    let name = non_blank(args.name.as_deref()).ok_or_else(missing)?;
    let base_url = non_blank(args.base_url.as_deref()).ok_or_else(missing)?;
    let row = System {
        id: String::new(),
        name,
        base_url,
        auth_type: AuthType::from_user_input(args.auth.as_deref()),
        docs_url: non_blank(args.docs_url.as_deref()),
        created_at: String::new(),
    };
    let system = ctx.store.insert(row)?;
    tracing::info!(system_id = %system.id, auth = %system.auth_type, "system created");
    Ok(system)
}

fn run_discovery(ctx: &WorkbenchContext, command: &DiscoveryCommand) -> Result<()> {
    match command {
        DiscoveryCommand::Set(args) => {
            let sample = set_discovery_sample(ctx, args)?;
            print_json(&json!({ "sample": sample }))
        }
        DiscoveryCommand::Show(args) => {
            let sample = ctx.discovery_sample(&args.id)?;
            print_json(&json!({ "sample": sample }))
        }
        DiscoveryCommand::Fields(args) => {
            let fields = ctx
                .discovery_sample(&args.id)?
                .map(|sample| extract_fields(&sample))
                .unwrap_or_default();
            print_json(&fields)
        }
    }
}

fn set_discovery_sample(ctx: &WorkbenchContext, args: &DiscoverySetArgs) -> Result<Value> {
    ctx.store.require::<System>(&args.id, "System")?;
    let text = read_text_input(args.file.as_deref(), args.json.as_deref())?;
    let sample = parse_user_json(&text, "sample")?;
    let endpoint = ctx.store_discovery_sample(&args.id, sample)?;
    tracing::info!(system_id = %args.id, "discovery sample stored");
    Ok(endpoint.response_schema)
}

/// `{field_path: flag}` for one system.
fn field_flags(ctx: &WorkbenchContext, system_id: &str) -> Result<Map<String, Value>> {
    let rows = ctx
        .store
        .find::<FieldFlag, _>(|flag| flag.system_id == system_id)?;
    Ok(rows
        .into_iter()
        .map(|row| (row.field_path, Value::String(row.flag.as_str().to_string())))
        .collect())
}

fn set_field_flag(ctx: &WorkbenchContext, args: &FlagArgs) -> Result<Value> {
    let path = required(Some(args.path.as_str()), "field_path required")?;
    let Some(raw_flag) = non_blank(args.flag.as_deref()) else {
        ctx.store.delete_where(|row: &FieldFlag| {
            row.system_id == args.id && row.field_path == path
        })?;
        return Ok(json!({ "ok": true, "flag": null }));
    };
    let flag: FieldFlagKind = raw_flag.parse()?;
    let row = FieldFlag {
        id: String::new(),
        system_id: args.id.clone(),
        field_path: path.clone(),
        flag,
        created_at: String::new(),
    };
    let saved = ctx.store.upsert_by(row, |existing: &FieldFlag| {
        existing.system_id == args.id && existing.field_path == path
    })?;
    Ok(serde_json::to_value(saved)?)
}

fn run_simulate(ctx: &WorkbenchContext, args: &SimulateArgs) -> Result<()> {
    let payload = args
        .payload
        .as_deref()
        .map(|text| parse_user_json(text, "payload"))
        .transpose()?;
    let sample = ctx.discovery_sample(&args.id)?;
    print_json(&simulate(sample.as_ref(), payload.as_ref()))
}

fn run_test(ctx: &WorkbenchContext, args: &TestArgs) -> Result<()> {
    let system = ctx.store.require::<System>(&args.id, "System")?;
    let body = args
        .body
        .as_deref()
        .map(|text| parse_user_json(text, "body"))
        .transpose()?;
    let request = ProbeRequest {
        method: Some(args.method.clone()),
        path: args.path.clone(),
        api_key: args.api_key.clone(),
        bearer_token: args.bearer_token.clone(),
        body,
    };
    let timeout = Duration::from_millis(ctx.config.file.probe.timeout_ms);
    let generator = ctx.generator(None);
    let assistant = Assistant::new(generator.as_ref(), ctx.paths());
    let report = run_probe(&system, &request, timeout, &assistant)?;
    print_json(&report)
}
