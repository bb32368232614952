#![allow(clippy::missing_safety_doc)]

use std::ffi::c_void;
use std::ptr;
use std::time::Duration;

use log::warn;
use scan_arbiter_core::{ArbiterState, Decision, RecognitionPass, ScanMode, Timestamp};
use scan_arbiter_session::{
    CandidateFilter, Feedback, ScanConfig, ScanError, ScanResult, ScanSession, SessionSnapshot,
};

/// FFI ABI version for scan_arbiter_ffi.
///
/// Bump this when any `#[repr(C)]` struct layout or exported function signature changes.
pub const SCAN_ARBITER_FFI_VERSION: u32 = 2;

#[no_mangle]
pub extern "C" fn scan_arbiter_ffi_version() -> u32 {
    SCAN_ARBITER_FFI_VERSION
}

// Snapshot wire format identification.
const SNAP_MAGIC: u32 = 0x314E_4353; // "SCN1" little-endian
const SNAP_VERSION: u32 = 2;

// Return codes.
pub const SCAN_OK: i32 = 0;
pub const SCAN_ERR_NULL: i32 = -1;
pub const SCAN_ERR_TRUNCATED: i32 = -2;
pub const SCAN_ERR_BAD_UTF8: i32 = -5;
pub const SCAN_ERR_BAD_MAGIC: i32 = -8;
pub const SCAN_ERR_BAD_VERSION: i32 = -9;
pub const SCAN_ERR_MODE_MISMATCH: i32 = -10;
pub const SCAN_ERR_BAD_FAILURE_CODE: i32 = -11;
pub const SCAN_ERR_BAD_MODE: i32 = -12;
pub const SCAN_ERR_BAD_TIME: i32 = -13;

// `ScanOutcome::status` values; 0 is a successful scan.
pub const SCAN_FAILURE_BAD_INPUT: i32 = 1;
pub const SCAN_FAILURE_BAD_OUTPUT: i32 = 2;
pub const SCAN_FAILURE_INIT: i32 = 3;
pub const SCAN_FAILURE_PERMISSION_DENIED: i32 = 4;

// `ScanCfg::mode` values.
pub const SCAN_MODE_ONCE: u8 = 0;
pub const SCAN_MODE_ONCE_PER_VALUE: u8 = 1;
pub const SCAN_MODE_CONTINUOUS: u8 = 2;
pub const SCAN_MODE_MANUAL: u8 = 3;

/// Opaque session handle exposed over FFI.
pub struct ScanArbiterSession {
    inner: ScanSession<String>,
}

/// FFI string view (UTF-8 bytes).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ScanStr {
    pub ptr: *const u8,
    pub len: usize,
}

impl ScanStr {
    fn as_str(&self) -> Option<&str> {
        if self.ptr.is_null() {
            return None;
        }
        let bytes = unsafe { std::slice::from_raw_parts(self.ptr, self.len) };
        std::str::from_utf8(bytes).ok()
    }

    fn borrowed(s: &str) -> Self {
        ScanStr { ptr: s.as_ptr(), len: s.len() }
    }

    fn null() -> Self {
        ScanStr { ptr: ptr::null(), len: 0 }
    }
}

/// Decision as a C-friendly enum.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanDecision {
    Suppress = 0,
    Emit = 1,
}

/// Delivered to `on_result`. `value` is only valid for the duration of the callback.
#[repr(C)]
pub struct ScanOutcome {
    /// 0 on success, otherwise one of `SCAN_FAILURE_*`.
    pub status: i32,
    /// Accepted value on success; error detail (possibly empty) on failure.
    pub value: ScanStr,
    /// Host seconds; NaN on failure.
    pub observed_at: f64,
}

pub type ScanResultCallback = extern "C" fn(user_data: *mut c_void, outcome: *const ScanOutcome);
pub type ScanFeedbackCallback = extern "C" fn(user_data: *mut c_void);
pub type ScanValidateCallback = extern "C" fn(user_data: *mut c_void, candidate: ScanStr) -> u8;

/// Host callbacks. Any of them may be null.
///
/// Callbacks run on whichever thread called into the session; `user_data`
/// must be usable from all of them.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ScanCallbacks {
    pub user_data: *mut c_void,
    pub on_result: Option<ScanResultCallback>,
    pub on_success: Option<ScanFeedbackCallback>,
    pub validate: Option<ScanValidateCallback>,
}

#[derive(Clone, Copy)]
struct HostCallbacks(ScanCallbacks);

// The host contract on `ScanCallbacks` makes these sound.
unsafe impl Send for HostCallbacks {}
unsafe impl Sync for HostCallbacks {}

impl HostCallbacks {
    fn deliver(&self, r: Result<ScanResult<String>, ScanError>) {
        let Some(cb) = self.0.on_result else {
            return;
        };
        match r {
            Ok(res) => {
                let outcome = ScanOutcome {
                    status: 0,
                    value: ScanStr::borrowed(&res.value),
                    observed_at: res.observed_at.as_secs_f64(),
                };
                cb(self.0.user_data, &outcome);
            }
            Err(err) => {
                let detail = match &err {
                    ScanError::InitError(msg) => msg.as_str(),
                    _ => "",
                };
                let outcome = ScanOutcome {
                    status: failure_to_ffi(&err),
                    value: ScanStr::borrowed(detail),
                    observed_at: f64::NAN,
                };
                cb(self.0.user_data, &outcome);
            }
        }
    }
}

impl CandidateFilter<String> for HostCallbacks {
    fn validate(&self, candidate: &String) -> bool {
        match self.0.validate {
            Some(f) => f(self.0.user_data, ScanStr::borrowed(candidate)) != 0,
            None => true,
        }
    }
}

impl Feedback for HostCallbacks {
    fn on_success(&self) {
        if let Some(f) = self.0.on_success {
            f(self.0.user_data);
        }
    }
}

/// Session cfg for FFI (durations in seconds).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ScanCfg {
    pub mode: u8,
    pub scan_interval_secs: f64,
    pub manual_window_secs: f64,
    pub vibrate_on_success: u8,
    /// Null means no simulated data.
    pub simulated_data: ScanStr,
}

#[no_mangle]
pub extern "C" fn scan_arbiter_cfg_default() -> ScanCfg {
    let d = ScanConfig::default();
    ScanCfg {
        mode: mode_to_ffi(d.mode),
        scan_interval_secs: d.scan_interval.as_secs_f64(),
        manual_window_secs: d.manual_window.as_secs_f64(),
        vibrate_on_success: if d.vibrate_on_success { 1 } else { 0 },
        simulated_data: ScanStr::null(),
    }
}

fn mode_to_ffi(m: ScanMode) -> u8 {
    match m {
        ScanMode::Once => SCAN_MODE_ONCE,
        ScanMode::OncePerValue => SCAN_MODE_ONCE_PER_VALUE,
        ScanMode::Continuous => SCAN_MODE_CONTINUOUS,
        ScanMode::Manual => SCAN_MODE_MANUAL,
    }
}

fn mode_from_ffi(m: u8) -> Option<ScanMode> {
    match m {
        SCAN_MODE_ONCE => Some(ScanMode::Once),
        SCAN_MODE_ONCE_PER_VALUE => Some(ScanMode::OncePerValue),
        SCAN_MODE_CONTINUOUS => Some(ScanMode::Continuous),
        SCAN_MODE_MANUAL => Some(ScanMode::Manual),
        _ => None,
    }
}

fn secs_from_ffi(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok()
}

/// Host seconds to an exact timestamp. NaN and infinities are refused.
fn time_from_ffi(what: &str, now: f64) -> Option<Timestamp> {
    let t = Timestamp::from_secs_f64(now);
    if t.is_none() {
        warn!("{}: rejecting timestamp {}", what, now);
    }
    t
}

fn cfg_from_ffi(c: ScanCfg) -> Option<ScanConfig> {
    Some(ScanConfig {
        mode: mode_from_ffi(c.mode)?,
        scan_interval: secs_from_ffi(c.scan_interval_secs)?,
        manual_window: secs_from_ffi(c.manual_window_secs)?,
        vibrate_on_success: c.vibrate_on_success != 0,
        simulated_data: c
            .simulated_data
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

fn decision_to_ffi(d: Decision) -> ScanDecision {
    match d {
        Decision::Emit => ScanDecision::Emit,
        Decision::Suppress => ScanDecision::Suppress,
    }
}

fn failure_to_ffi(e: &ScanError) -> i32 {
    match e {
        ScanError::BadInput => SCAN_FAILURE_BAD_INPUT,
        ScanError::BadOutput => SCAN_FAILURE_BAD_OUTPUT,
        ScanError::InitError(_) => SCAN_FAILURE_INIT,
        ScanError::PermissionDenied => SCAN_FAILURE_PERMISSION_DENIED,
    }
}

fn failure_from_ffi(code: i32, detail: &str) -> Option<ScanError> {
    match code {
        SCAN_FAILURE_BAD_INPUT => Some(ScanError::BadInput),
        SCAN_FAILURE_BAD_OUTPUT => Some(ScanError::BadOutput),
        SCAN_FAILURE_INIT => Some(ScanError::InitError(detail.to_string())),
        SCAN_FAILURE_PERMISSION_DENIED => Some(ScanError::PermissionDenied),
        _ => None,
    }
}

/// Install `env_logger` (reads `RUST_LOG`). Returns 1 if a logger was already set.
#[no_mangle]
pub extern "C" fn scan_arbiter_init_logging() -> i32 {
    match env_logger::Builder::from_default_env().try_init() {
        Ok(()) => SCAN_OK,
        Err(_) => 1,
    }
}

/// Create a new session handle. Returns null for an unknown mode or a
/// negative/non-finite interval.
#[no_mangle]
pub extern "C" fn scan_session_new(cfg: ScanCfg, callbacks: ScanCallbacks) -> *mut ScanArbiterSession {
    let Some(config) = cfg_from_ffi(cfg) else {
        warn!("scan_session_new: invalid cfg (mode={})", cfg.mode);
        return ptr::null_mut();
    };
    let host = HostCallbacks(callbacks);
    let session = ScanSession::new(config, move |r| host.deliver(r))
        .with_filter(host)
        .with_feedback(host);
    Box::into_raw(Box::new(ScanArbiterSession { inner: session }))
}

#[no_mangle]
pub unsafe extern "C" fn scan_session_free(h: *mut ScanArbiterSession) {
    if !h.is_null() {
        drop(Box::from_raw(h));
    }
}

/// Submit the candidates of one recognition pass observed at `now`
/// (seconds on the host's monotonic clock). Candidates that are not valid
/// UTF-8 are skipped. A non-finite `now` is suppressed without touching the
/// session. `on_result` fires before this returns on `Emit`.
#[no_mangle]
pub unsafe extern "C" fn scan_session_submit(
    h: *mut ScanArbiterSession,
    candidates_ptr: *const ScanStr,
    candidates_len: usize,
    now: f64,
) -> ScanDecision {
    if h.is_null() || candidates_ptr.is_null() || candidates_len == 0 {
        return ScanDecision::Suppress;
    }
    let Some(now) = time_from_ffi("scan_session_submit", now) else {
        return ScanDecision::Suppress;
    };
    let handle = &*h;
    let raw = std::slice::from_raw_parts(candidates_ptr, candidates_len);
    let candidates = raw.iter().filter_map(|c| c.as_str().map(str::to_string));
    let pass = RecognitionPass::with_candidates(candidates, now);
    decision_to_ffi(handle.inner.submit_pass(pass))
}

#[no_mangle]
pub unsafe extern "C" fn scan_session_reset(h: *mut ScanArbiterSession) -> i32 {
    if h.is_null() {
        return SCAN_ERR_NULL;
    }
    (*h).inner.reset();
    SCAN_OK
}

/// Open the manual capture window at `now`. `SCAN_ERR_BAD_TIME` for a
/// non-finite `now`.
#[no_mangle]
pub unsafe extern "C" fn scan_session_arm_manual_capture(h: *mut ScanArbiterSession, now: f64) -> i32 {
    if h.is_null() {
        return SCAN_ERR_NULL;
    }
    let Some(now) = time_from_ffi("scan_session_arm_manual_capture", now) else {
        return SCAN_ERR_BAD_TIME;
    };
    (*h).inner.arm_manual_capture_at(now);
    SCAN_OK
}

/// 1 if the host should run recognition on the next frame.
#[no_mangle]
pub unsafe extern "C" fn scan_session_should_process_frame(h: *mut ScanArbiterSession) -> u8 {
    if h.is_null() {
        return 0;
    }
    (*h).inner.should_process_frame() as u8
}

#[no_mangle]
pub unsafe extern "C" fn scan_session_set_capturing(h: *mut ScanArbiterSession, capturing: u8) -> i32 {
    if h.is_null() {
        return SCAN_ERR_NULL;
    }
    if capturing != 0 {
        (*h).inner.resume_capture();
    } else {
        (*h).inner.pause_capture();
    }
    SCAN_OK
}

/// Forward a capture-pipeline failure (`SCAN_FAILURE_*`) to `on_result`.
#[no_mangle]
pub unsafe extern "C" fn scan_session_fail(h: *mut ScanArbiterSession, code: i32, detail: ScanStr) -> i32 {
    if h.is_null() {
        return SCAN_ERR_NULL;
    }
    let Some(err) = failure_from_ffi(code, detail.as_str().unwrap_or("")) else {
        return SCAN_ERR_BAD_FAILURE_CODE;
    };
    (*h).inner.fail(err);
    SCAN_OK
}

/// Deliver the configured simulated data as a scan. Returns 1 if delivered,
/// 0 when no simulated data is configured, or a negative error code.
#[no_mangle]
pub unsafe extern "C" fn scan_session_simulate(h: *mut ScanArbiterSession, now: f64) -> i32 {
    if h.is_null() {
        return SCAN_ERR_NULL;
    }
    let Some(now) = time_from_ffi("scan_session_simulate", now) else {
        return SCAN_ERR_BAD_TIME;
    };
    (*h).inner.simulate_at(now) as i32
}

/// Owned byte buffer (for snapshot).
#[repr(C)]
pub struct ScanBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

/// Snapshot format (binary, little-endian):
/// [u32 magic = "SCN1"][u32 version = 2][u32 mode][u32 finished]
/// [u32 has_last_emit][i64 last_emit_at nanos][u32 count]
/// repeated count times (sorted):
///   [u32 strlen][bytes...]
fn encode_snapshot(snap: &SessionSnapshot<String>) -> Vec<u8> {
    let st = &snap.state;
    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(&SNAP_MAGIC.to_le_bytes());
    buf.extend_from_slice(&SNAP_VERSION.to_le_bytes());
    buf.extend_from_slice(&(mode_to_ffi(snap.mode) as u32).to_le_bytes());
    buf.extend_from_slice(&(st.finished as u32).to_le_bytes());
    buf.extend_from_slice(&(st.last_emit_at.is_some() as u32).to_le_bytes());
    buf.extend_from_slice(&st.last_emit_at.map_or(0, Timestamp::as_nanos).to_le_bytes());

    let mut values: Vec<&String> = st.accepted_values.iter().collect();
    values.sort();
    buf.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for v in values {
        buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
        buf.extend_from_slice(v.as_bytes());
    }
    buf
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], i32> {
        let end = self.pos.checked_add(n).ok_or(SCAN_ERR_TRUNCATED)?;
        let out = self.data.get(self.pos..end).ok_or(SCAN_ERR_TRUNCATED)?;
        self.pos = end;
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, i32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i64(&mut self) -> Result<i64, i32> {
        let b = self.take(8)?;
        let mut a = [0u8; 8];
        a.copy_from_slice(b);
        Ok(i64::from_le_bytes(a))
    }
}

fn decode_snapshot(data: &[u8]) -> Result<SessionSnapshot<String>, i32> {
    let mut r = Reader { data, pos: 0 };
    if r.u32()? != SNAP_MAGIC {
        return Err(SCAN_ERR_BAD_MAGIC);
    }
    if r.u32()? != SNAP_VERSION {
        return Err(SCAN_ERR_BAD_VERSION);
    }
    let mode = u8::try_from(r.u32()?)
        .ok()
        .and_then(mode_from_ffi)
        .ok_or(SCAN_ERR_BAD_MODE)?;
    let finished = r.u32()? != 0;
    let has_last = r.u32()? != 0;
    let last = Timestamp::from_nanos(r.i64()?);
    let count = r.u32()? as usize;

    let mut state = ArbiterState::default();
    state.finished = finished;
    state.last_emit_at = has_last.then_some(last);
    for _ in 0..count {
        let len = r.u32()? as usize;
        let bytes = r.take(len)?;
        let v = std::str::from_utf8(bytes).map_err(|_| SCAN_ERR_BAD_UTF8)?;
        state.accepted_values.insert(v.to_string());
    }
    Ok(SessionSnapshot { mode, state })
}

#[no_mangle]
pub unsafe extern "C" fn scan_session_snapshot(h: *mut ScanArbiterSession) -> ScanBytes {
    if h.is_null() {
        return ScanBytes { ptr: ptr::null_mut(), len: 0 };
    }
    let buf = encode_snapshot(&(*h).inner.snapshot());

    let mut boxed = buf.into_boxed_slice();
    let ptr = boxed.as_mut_ptr();
    let len = boxed.len();
    std::mem::forget(boxed);

    ScanBytes { ptr, len }
}

#[no_mangle]
pub unsafe extern "C" fn scan_bytes_free(b: ScanBytes) {
    if !b.ptr.is_null() {
        let slice_ptr = std::ptr::slice_from_raw_parts_mut(b.ptr, b.len);
        drop(Box::from_raw(slice_ptr));
    }
}

/// Restore session state from `scan_session_snapshot` bytes. The snapshot
/// must come from a session in the same mode.
#[no_mangle]
pub unsafe extern "C" fn scan_session_restore(h: *mut ScanArbiterSession, bytes: *const u8, len: usize) -> i32 {
    if h.is_null() || bytes.is_null() {
        return SCAN_ERR_NULL;
    }
    let data = std::slice::from_raw_parts(bytes, len);
    let snap = match decode_snapshot(data) {
        Ok(s) => s,
        Err(rc) => {
            warn!("scan_session_restore: rejected snapshot (rc={})", rc);
            return rc;
        }
    };
    match (*h).inner.restore(snap) {
        Ok(()) => SCAN_OK,
        Err(_) => SCAN_ERR_MODE_MISMATCH,
    }
}
