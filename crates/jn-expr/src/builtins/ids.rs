//! Identifier generators (§4.H). `seq` is a monotonic counter for the
//! whole process; `xid`'s machine ID and counter are thread-local, since
//! the engine makes no cross-process uniqueness claim (§9). Every
//! generator that is not a standard UUID/ULID derives its entropy from a
//! v4 UUID, which is already in the dependency stack, rather than pulling
//! in a separate randomness crate for a handful of short ID formats.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use uuid::Uuid;

static SEQ_COUNTER: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static XID_MACHINE_ID: [u8; 3] = {
        let bytes = Uuid::new_v4().into_bytes();
        [bytes[0], bytes[1], bytes[2]]
    };
    static XID_COUNTER: Cell<u32> = Cell::new(0);
}

const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZabcdefghjkmnpqrstvwxyz";

pub fn dispatch(name: &str, _input: &Value, _args: &[Value]) -> Option<Vec<Value>> {
    let out = match name {
        "uuid" => Value::String(Uuid::new_v4().to_string()),
        "uuid7" => Value::String(Uuid::now_v7().to_string()),
        "ulid" => Value::String(ulid::Ulid::new().to_string()),
        "xid" => Value::String(xid()),
        "nanoid" => Value::String(random_alphabet_string(21)),
        "shortid" => Value::String(random_alphabet_string(8)),
        "sid" => Value::String(sid()),
        "seq" => Value::from(SEQ_COUNTER.fetch_add(1, Ordering::Relaxed) as i64),
        "random" => Value::from(random_unit_float()),
        _ => return None,
    };
    Some(vec![out])
}

fn xid() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    let machine = XID_MACHINE_ID.with(|m| *m);
    let counter = XID_COUNTER.with(|c| {
        let v = c.get();
        c.set(v.wrapping_add(1) & 0x00FF_FFFF);
        v & 0x00FF_FFFF
    });

    let mut buf = Vec::with_capacity(10);
    buf.extend_from_slice(&secs.to_be_bytes());
    buf.extend_from_slice(&machine);
    buf.extend_from_slice(&counter.to_be_bytes()[1..]);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

fn random_alphabet_string(len: usize) -> String {
    let mut out = String::with_capacity(len);
    let mut pool = Uuid::new_v4().into_bytes().to_vec();
    while pool.len() < len {
        pool.extend_from_slice(&Uuid::new_v4().into_bytes());
    }
    for &b in pool.iter().take(len) {
        out.push(ALPHABET[(b as usize) % ALPHABET.len()] as char);
    }
    out
}

fn sid() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{secs:010x}{}", random_alphabet_string(8))
}

fn random_unit_float() -> f64 {
    let bytes = Uuid::new_v4().into_bytes();
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    (u64::from_be_bytes(buf) as f64) / (u64::MAX as f64)
}
