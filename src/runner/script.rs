use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsArgs, JsError, JsValue, NativeFunction, Source};

use crate::dom::{CdpDocument, Document, ElementState};
use crate::locate::{self, LocatorResult, ResolutionOptions};
use crate::report::{StepRecord, StepStatus};

/// Result of executing one test script.
pub struct ScriptOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub steps: Vec<StepRecord>,
    pub output: Vec<String>,
}

/// Everything the native script functions need, shared across the boa thread
/// and the async runtime.
struct ScriptWorld {
    handle: tokio::runtime::Handle,
    doc: Arc<CdpDocument>,
    base_options: ResolutionOptions,
    steps: Mutex<Vec<StepRecord>>,
    output_lines: Mutex<Vec<String>>,
}

impl ScriptWorld {
    fn record(
        &self,
        action: &str,
        target: &str,
        resolved: Option<&LocatorResult>,
        error: Option<String>,
        started: Instant,
    ) {
        let mut steps = self.steps.lock().unwrap();
        let index = steps.len() + 1;
        steps.push(StepRecord {
            index,
            action: action.to_string(),
            target: target.to_string(),
            detail: None,
            strategy: resolved.map(|r| r.strategy.to_string()),
            confidence: resolved.map(|r| r.confidence),
            elapsed_ms: started.elapsed().as_millis() as u64,
            status: if error.is_none() {
                StepStatus::Passed
            } else {
                StepStatus::Failed
            },
            error,
        });
    }

    /// Per-call options: the config baseline with script-level `timeout` /
    /// `retries` overrides applied.
    fn options_from(&self, overrides: &JsValue, js_ctx: &mut Context) -> ResolutionOptions {
        let mut options = self.base_options.clone();
        if let Some(ms) = get_number_prop(overrides, "timeout", js_ctx) {
            options.timeout = std::time::Duration::from_millis(ms as u64);
        }
        if let Some(n) = get_number_prop(overrides, "retries", js_ctx) {
            options.max_retries = (n as u32).max(1);
        }
        options
    }
}

/// Run a JS test script against a live page. Smart actions are exposed on the
/// global `page` object; `console.log` output is captured for the report.
pub async fn run_script(
    doc: Arc<CdpDocument>,
    options: ResolutionOptions,
    source: String,
) -> Result<ScriptOutcome> {
    let world = Arc::new(ScriptWorld {
        handle: tokio::runtime::Handle::current(),
        doc,
        base_options: options,
        steps: Mutex::new(Vec::new()),
        output_lines: Mutex::new(Vec::new()),
    });

    let world_clone = world.clone();
    let result =
        tokio::task::spawn_blocking(move || execute_in_boa(&world_clone, &source)).await?;

    let steps = world.steps.lock().unwrap().clone();
    let output = world.output_lines.lock().unwrap().clone();

    Ok(match result {
        Ok(()) => ScriptOutcome {
            success: true,
            error: None,
            steps,
            output,
        },
        Err(message) => ScriptOutcome {
            success: false,
            error: Some(message),
            steps,
            output,
        },
    })
}

fn execute_in_boa(world: &Arc<ScriptWorld>, source: &str) -> Result<(), String> {
    let mut js_ctx = Context::default();

    let page_obj = build_page_object(world, &mut js_ctx);
    js_ctx
        .register_global_property(boa_engine::js_string!("page"), page_obj, Attribute::all())
        .map_err(|e| format!("Failed to register page object: {e}"))?;

    let console_obj = build_console_object(world, &mut js_ctx);
    js_ctx
        .register_global_property(boa_engine::js_string!("console"), console_obj, Attribute::all())
        .map_err(|e| format!("Failed to register console object: {e}"))?;

    match js_ctx.eval(Source::from_bytes(source)) {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("{e}")),
    }
}

fn build_page_object(world: &Arc<ScriptWorld>, js_ctx: &mut Context) -> JsValue {
    let mut builder = ObjectInitializer::new(js_ctx);
    builder.function(make_navigate(world.clone()), boa_engine::js_string!("navigate"), 1);
    builder.function(make_click(world.clone()), boa_engine::js_string!("click"), 2);
    builder.function(make_fill(world.clone()), boa_engine::js_string!("fill"), 3);
    builder.function(make_select(world.clone()), boa_engine::js_string!("select"), 3);
    builder.function(make_wait_for(world.clone()), boa_engine::js_string!("waitFor"), 2);
    builder.function(make_get_text(world.clone()), boa_engine::js_string!("getText"), 1);
    builder.function(make_wait(world.clone()), boa_engine::js_string!("wait"), 1);
    builder.build().into()
}

fn build_console_object(world: &Arc<ScriptWorld>, js_ctx: &mut Context) -> JsValue {
    let mut builder = ObjectInitializer::new(js_ctx);
    builder.function(make_console_log(world.clone()), boa_engine::js_string!("log"), 1);
    builder.function(make_console_log(world.clone()), boa_engine::js_string!("info"), 1);
    builder.function(make_console_log(world.clone()), boa_engine::js_string!("warn"), 1);
    builder.function(make_console_log(world.clone()), boa_engine::js_string!("error"), 1);
    builder.build().into()
}

fn get_string_prop(obj: &JsValue, key: &str, js_ctx: &mut Context) -> Option<String> {
    let obj = obj.as_object()?;
    let val = obj.get(boa_engine::js_string!(key), js_ctx).ok()?;
    if val.is_undefined() || val.is_null() {
        return None;
    }
    Some(val.to_string(js_ctx).ok()?.to_std_string_escaped())
}

fn get_number_prop(obj: &JsValue, key: &str, js_ctx: &mut Context) -> Option<f64> {
    let obj = obj.as_object()?;
    let val = obj.get(boa_engine::js_string!(key), js_ctx).ok()?;
    if val.is_undefined() || val.is_null() {
        return None;
    }
    val.to_number(js_ctx).ok()
}

fn js_err(msg: impl std::fmt::Display) -> JsError {
    JsError::from_opaque(JsValue::from(boa_engine::js_string!(msg.to_string())))
}

// ── Native function factories ──────────────────────────────────────────

fn make_navigate(world: Arc<ScriptWorld>) -> NativeFunction {
    // Safety: Arc<ScriptWorld> is not a JS GC-managed type, so no GC tracing
    // is needed
    unsafe {
        NativeFunction::from_closure(move |_this, args, js_ctx| {
            let url = args.get_or_undefined(0).to_string(js_ctx)?.to_std_string_escaped();
            let started = Instant::now();

            let page = world.doc.page().clone();
            let outcome = world.handle.block_on(async {
                page.goto(&url).await?;
                // goto waits for the load event; give post-load JS a moment
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                let title = page.get_title().await?.unwrap_or_default();
                anyhow::Ok(title)
            });
            world.doc.clear_handles();

            match outcome {
                Ok(title) => {
                    world.record("navigate", &url, None, None, started);
                    Ok(JsValue::from(boa_engine::js_string!(title)))
                }
                Err(err) => {
                    world.record("navigate", &url, None, Some(format!("{err:#}")), started);
                    Err(js_err(err))
                }
            }
        })
    }
}

fn make_click(world: Arc<ScriptWorld>) -> NativeFunction {
    unsafe {
        NativeFunction::from_closure(move |_this, args, js_ctx| {
            let description = args.get_or_undefined(0).to_string(js_ctx)?.to_std_string_escaped();
            let options = world.options_from(&args.get_or_undefined(1).clone(), js_ctx);
            let started = Instant::now();

            let doc = world.doc.clone();
            let outcome = world
                .handle
                .block_on(async { locate::smart_click(doc.as_ref(), &description, &options).await });
            world.doc.clear_handles();

            match outcome {
                Ok(result) => {
                    let message = format!(
                        "Clicked via {} (confidence {:.2})",
                        result.strategy, result.confidence
                    );
                    world.record("click", &description, Some(&result), None, started);
                    Ok(JsValue::from(boa_engine::js_string!(message)))
                }
                Err(err) => {
                    world.record("click", &description, None, Some(err.to_string()), started);
                    Err(js_err(err))
                }
            }
        })
    }
}

fn make_fill(world: Arc<ScriptWorld>) -> NativeFunction {
    unsafe {
        NativeFunction::from_closure(move |_this, args, js_ctx| {
            let description = args.get_or_undefined(0).to_string(js_ctx)?.to_std_string_escaped();
            let value = args.get_or_undefined(1).to_string(js_ctx)?.to_std_string_escaped();
            let options = world.options_from(&args.get_or_undefined(2).clone(), js_ctx);
            let started = Instant::now();

            let doc = world.doc.clone();
            let outcome = world.handle.block_on(async {
                locate::smart_fill(doc.as_ref(), &description, &value, &options).await
            });
            world.doc.clear_handles();

            match outcome {
                Ok(result) => {
                    world.record("fill", &description, Some(&result), None, started);
                    Ok(JsValue::from(boa_engine::js_string!("Filled")))
                }
                Err(err) => {
                    world.record("fill", &description, None, Some(err.to_string()), started);
                    Err(js_err(err))
                }
            }
        })
    }
}

fn make_select(world: Arc<ScriptWorld>) -> NativeFunction {
    unsafe {
        NativeFunction::from_closure(move |_this, args, js_ctx| {
            let description = args.get_or_undefined(0).to_string(js_ctx)?.to_std_string_escaped();
            let option_text = args.get_or_undefined(1).to_string(js_ctx)?.to_std_string_escaped();
            let options = world.options_from(&args.get_or_undefined(2).clone(), js_ctx);
            let started = Instant::now();

            let doc = world.doc.clone();
            let outcome = world.handle.block_on(async {
                locate::smart_select(doc.as_ref(), &description, &option_text, &options).await
            });
            world.doc.clear_handles();

            match outcome {
                Ok(result) => {
                    world.record("select", &description, Some(&result), None, started);
                    Ok(JsValue::from(boa_engine::js_string!("Selected")))
                }
                Err(err) => {
                    world.record("select", &description, None, Some(err.to_string()), started);
                    Err(js_err(err))
                }
            }
        })
    }
}

fn make_wait_for(world: Arc<ScriptWorld>) -> NativeFunction {
    unsafe {
        NativeFunction::from_closure(move |_this, args, js_ctx| {
            let description = args.get_or_undefined(0).to_string(js_ctx)?.to_std_string_escaped();
            let overrides = args.get_or_undefined(1).clone();
            let options = world.options_from(&overrides, js_ctx);
            let state = get_string_prop(&overrides, "state", js_ctx)
                .as_deref()
                .unwrap_or("visible")
                .parse::<ElementState>()
                .map_err(js_err)?;
            let started = Instant::now();

            let doc = world.doc.clone();
            let outcome = world.handle.block_on(async {
                locate::smart_wait(doc.as_ref(), &description, state, &options).await
            });
            world.doc.clear_handles();

            match outcome {
                Ok(result) => {
                    world.record("waitFor", &description, Some(&result), None, started);
                    Ok(JsValue::from(boa_engine::js_string!("Found")))
                }
                Err(err) => {
                    world.record("waitFor", &description, None, Some(err.to_string()), started);
                    Err(js_err(err))
                }
            }
        })
    }
}

fn make_get_text(world: Arc<ScriptWorld>) -> NativeFunction {
    unsafe {
        NativeFunction::from_closure(move |_this, args, js_ctx| {
            let description = args.get_or_undefined(0).to_string(js_ctx)?.to_std_string_escaped();
            let options = world.base_options.clone();
            let started = Instant::now();

            let doc = world.doc.clone();
            let outcome = world.handle.block_on(async {
                match locate::find_by_text(doc.as_ref(), &description, &options).await {
                    Some(result) => {
                        let text = doc.text_content(result.element).await?;
                        anyhow::Ok((result, text))
                    }
                    None => anyhow::bail!("could not find element for description '{description}'"),
                }
            });
            world.doc.clear_handles();

            match outcome {
                Ok((result, text)) => {
                    world.record("getText", &description, Some(&result), None, started);
                    Ok(JsValue::from(boa_engine::js_string!(text)))
                }
                Err(err) => {
                    world.record("getText", &description, None, Some(format!("{err:#}")), started);
                    Err(js_err(err))
                }
            }
        })
    }
}

fn make_wait(world: Arc<ScriptWorld>) -> NativeFunction {
    unsafe {
        NativeFunction::from_closure(move |_this, args, js_ctx| {
            let ms = args.get_or_undefined(0).to_number(js_ctx)? as u64;
            world.handle.block_on(async {
                tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
            });
            Ok(JsValue::undefined())
        })
    }
}

fn make_console_log(world: Arc<ScriptWorld>) -> NativeFunction {
    unsafe {
        NativeFunction::from_closure(move |_this, args, js_ctx| {
            let mut parts = Vec::new();
            for i in 0..args.len() {
                let val = args.get_or_undefined(i);
                parts.push(val.to_string(js_ctx)?.to_std_string_escaped());
            }
            world.output_lines.lock().unwrap().push(parts.join(" "));
            Ok(JsValue::undefined())
        })
    }
}
