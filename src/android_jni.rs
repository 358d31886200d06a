//! JNI bindings for the Android app.
//!
//! Each public function here corresponds to a `external fun` declaration
//! in RustBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! Analysis calls are stateless: the app sends the GPX bytes, the
//! configuration and its current marker list as JSON on every call.
//! Engine errors are raised as `IllegalArgumentException`.

use jni::JNIEnv;
use jni::objects::{JByteArray, JClass, JString};
use jni::sys::jstring;
use log::error;

use crate::error::{EngineError, Result};
use crate::session;

/// Returns the rust-core library version.
/// Maps to: RustBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_raceplan_app_RustBridge_version(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    respond(&mut env, Ok(crate::VERSION.to_string()))
}

/// Routes `log` output to logcat. Safe to call more than once.
/// Maps to: RustBridge.initLogging()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_raceplan_app_RustBridge_initLogging(
    _env: JNIEnv,
    _class: JClass,
) {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Info)
            .with_tag("raceplan"),
    );
}

/// Maps to: RustBridge.analyzeGpx(gpx: ByteArray, configJson: String, markersJson: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_raceplan_app_RustBridge_analyzeGpx<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    gpx: JByteArray<'local>,
    config_json: JString<'local>,
    markers_json: JString<'local>,
) -> jstring {
    let result = read_request(&mut env, &gpx, &config_json, &markers_json)
        .and_then(|(data, config, markers)| session::analyze_to_json(&data, &config, &markers));
    respond(&mut env, result)
}

/// Maps to: RustBridge.exportSegmentsCsv(gpx: ByteArray, configJson: String, markersJson: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_raceplan_app_RustBridge_exportSegmentsCsv<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    gpx: JByteArray<'local>,
    config_json: JString<'local>,
    markers_json: JString<'local>,
) -> jstring {
    let result = read_request(&mut env, &gpx, &config_json, &markers_json)
        .and_then(|(data, config, markers)| session::export_csv(&data, &config, &markers));
    respond(&mut env, result)
}

fn read_request(
    env: &mut JNIEnv,
    gpx: &JByteArray,
    config_json: &JString,
    markers_json: &JString,
) -> Result<(Vec<u8>, String, String)> {
    let data = env
        .convert_byte_array(gpx)
        .map_err(|e| EngineError::InvalidConfig(format!("unreadable GPX bytes: {e}")))?;
    let config = read_string(env, config_json)?;
    let markers = read_string(env, markers_json)?;
    Ok((data, config, markers))
}

/// Null Java strings read as empty.
fn read_string(env: &mut JNIEnv, value: &JString) -> Result<String> {
    if value.is_null() {
        return Ok(String::new());
    }
    env.get_string(value)
        .map(String::from)
        .map_err(|e| EngineError::InvalidConfig(format!("unreadable string argument: {e}")))
}

fn respond(env: &mut JNIEnv, result: Result<String>) -> jstring {
    match result {
        Ok(text) => match env.new_string(text) {
            Ok(s) => s.into_raw(),
            Err(e) => {
                error!("failed to create Java string: {e}");
                std::ptr::null_mut()
            }
        },
        Err(e) => {
            error!("analysis failed: {e}");
            if let Err(jni_err) = env.throw_new("java/lang/IllegalArgumentException", e.to_string()) {
                error!("failed to throw exception: {jni_err}");
            }
            std::ptr::null_mut()
        }
    }
}
