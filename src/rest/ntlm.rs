/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! NTLMv2 message construction for HTTP authentication.
//!
//! The handshake takes two round trips on the same connection:
//! 1. Client sends the Negotiate (type 1) message
//! 2. Server answers `401` with the Challenge (type 2) message
//! 3. Client resends the request with the Authenticate (type 3) message
use crate::rest::errors::SharePointError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use md4::{Digest, Md4};
use md5::Md5;

const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
const NEGOTIATE_OEM: u32 = 0x0000_0002;
const REQUEST_TARGET: u32 = 0x0000_0004;
const NEGOTIATE_NTLM: u32 = 0x0000_0200;
const NEGOTIATE_ALWAYS_SIGN: u32 = 0x0000_8000;
const NEGOTIATE_EXTENDED_SESSION_SECURITY: u32 = 0x0008_0000;
const NEGOTIATE_128: u32 = 0x2000_0000;
const NEGOTIATE_56: u32 = 0x8000_0000;

const NEGOTIATE_FLAGS: u32 = NEGOTIATE_UNICODE
    | NEGOTIATE_OEM
    | REQUEST_TARGET
    | NEGOTIATE_NTLM
    | NEGOTIATE_ALWAYS_SIGN
    | NEGOTIATE_EXTENDED_SESSION_SECURITY
    | NEGOTIATE_128
    | NEGOTIATE_56;

// Fixed part of the type 3 message (no version, no MIC)
const AUTHENTICATE_HEADER_LEN: usize = 64;

// AV pair ids found in the challenge target info
const MSV_AV_EOL: u16 = 0;
const MSV_AV_TIMESTAMP: u16 = 7;

// Seconds between 1601-01-01 and 1970-01-01
const FILETIME_UNIX_OFFSET_SECS: u64 = 11_644_473_600;

/// Username/password used for the NTLM handshake
#[derive(Clone)]
pub(crate) struct NtlmCreds {
    user: String,
    password: String,
    domain: String,
    workstation: String,
}

impl NtlmCreds {
    /// A `DOMAIN\user` username is split into its domain and user parts
    pub(crate) fn new(username: &str, password: &str) -> Self {
        let (domain, user) = username.split_once('\\').unwrap_or(("", username));
        let workstation = std::env::var("COMPUTERNAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_else(|_| "WORKSTATION".to_string())
            .to_uppercase();
        Self {
            user: user.to_string(),
            password: password.to_string(),
            domain: domain.to_string(),
            workstation,
        }
    }

    /// `Authorization` header value opening the handshake
    pub(crate) fn negotiate_header(&self) -> String {
        format!("NTLM {}", STANDARD.encode(negotiate_message()))
    }

    /// `Authorization` header value answering the server challenge
    pub(crate) fn authenticate_header(&self, challenge_token: &str) -> Result<String, SharePointError> {
        let raw = STANDARD
            .decode(challenge_token.trim())
            .map_err(|e| SharePointError::Auth(format!("Malformed NTLM challenge: {e}")))?;
        let challenge = Challenge::parse(&raw)?;
        let timestamp = challenge.timestamp().unwrap_or_else(filetime_now);
        let client_challenge: [u8; 8] = rand::random();
        let msg = self.authenticate_message(&challenge, client_challenge, timestamp)?;
        Ok(format!("NTLM {}", STANDARD.encode(msg)))
    }

    fn authenticate_message(
        &self,
        challenge: &Challenge,
        client_challenge: [u8; 8],
        timestamp: u64,
    ) -> Result<Vec<u8>, SharePointError> {
        let key = ntowf_v2(&self.password, &self.user, &self.domain)?;

        let blob = client_blob(timestamp, &client_challenge, &challenge.target_info);
        let nt_proof = hmac_md5(&key, &[&challenge.server_challenge[..], &blob].concat())?;
        let nt_response = [&nt_proof[..], &blob].concat();

        // With a server timestamp the LM response is replaced by zeros
        let lm_response = if challenge.timestamp().is_some() {
            vec![0u8; 24]
        } else {
            lm_v2_response(&key, &challenge.server_challenge, &client_challenge)?
        };

        let domain = utf16le(&self.domain);
        let user = utf16le(&self.user);
        let workstation = utf16le(&self.workstation);
        let session_key: &[u8] = &[];
        let payloads: [&[u8]; 6] = [&lm_response, &nt_response, &domain, &user, &workstation, session_key];

        let mut msg = Vec::with_capacity(
            AUTHENTICATE_HEADER_LEN + payloads.iter().map(|p| p.len()).sum::<usize>(),
        );
        msg.extend_from_slice(SIGNATURE);
        msg.extend_from_slice(&3u32.to_le_bytes());

        let mut offset = AUTHENTICATE_HEADER_LEN as u32;
        for payload in payloads {
            let len = payload.len() as u16;
            msg.extend_from_slice(&len.to_le_bytes());
            msg.extend_from_slice(&len.to_le_bytes());
            msg.extend_from_slice(&offset.to_le_bytes());
            offset += len as u32;
        }

        let flags = (challenge.flags & NEGOTIATE_FLAGS) | NEGOTIATE_UNICODE | NEGOTIATE_NTLM;
        msg.extend_from_slice(&flags.to_le_bytes());

        for payload in payloads {
            msg.extend_from_slice(payload);
        }
        Ok(msg)
    }
}

impl std::fmt::Debug for NtlmCreds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NtlmCreds")
            .field("user", &self.user)
            .field("domain", &self.domain)
            .field("password", &"xxx")
            .finish()
    }
}

/// Returns the base64 token of an `NTLM <token>` challenge header value
pub(crate) fn challenge_token(www_authenticate: &str) -> Option<&str> {
    www_authenticate
        .strip_prefix("NTLM ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// Type 2 message fields used to build the response
struct Challenge {
    flags: u32,
    server_challenge: [u8; 8],
    target_info: Vec<u8>,
}

impl Challenge {
    fn parse(msg: &[u8]) -> Result<Self, SharePointError> {
        if msg.len() < 32 || &msg[..8] != SIGNATURE || read_u32(msg, 8) != 2 {
            return Err(SharePointError::Auth(
                "Invalid NTLM challenge message".to_string(),
            ));
        }
        let mut server_challenge = [0u8; 8];
        server_challenge.copy_from_slice(&msg[24..32]);

        let target_info = if msg.len() >= 48 {
            let len = read_u16(msg, 40) as usize;
            let offset = read_u32(msg, 44) as usize;
            msg.get(offset..offset + len).map(<[u8]>::to_vec).unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(Self {
            flags: read_u32(msg, 20),
            server_challenge,
            target_info,
        })
    }

    // MsvAvTimestamp from the target info AV pairs
    fn timestamp(&self) -> Option<u64> {
        let info = &self.target_info;
        let mut pos = 0;
        while pos + 4 <= info.len() {
            let id = read_u16(info, pos);
            let len = read_u16(info, pos + 2) as usize;
            let value = info.get(pos + 4..pos + 4 + len)?;
            match id {
                MSV_AV_EOL => return None,
                MSV_AV_TIMESTAMP if len == 8 => return Some(read_u64(value, 0)),
                _ => pos += 4 + len,
            }
        }
        None
    }
}

fn negotiate_message() -> Vec<u8> {
    let mut msg = Vec::with_capacity(32);
    msg.extend_from_slice(SIGNATURE);
    msg.extend_from_slice(&1u32.to_le_bytes());
    msg.extend_from_slice(&NEGOTIATE_FLAGS.to_le_bytes());
    // Empty domain and workstation buffers
    msg.extend_from_slice(&[0u8; 16]);
    msg
}

fn client_blob(timestamp: u64, client_challenge: &[u8; 8], target_info: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(32 + target_info.len());
    blob.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    blob.extend_from_slice(&timestamp.to_le_bytes());
    blob.extend_from_slice(client_challenge);
    blob.extend_from_slice(&[0u8; 4]);
    blob.extend_from_slice(target_info);
    blob.extend_from_slice(&[0u8; 4]);
    blob
}

fn nt_hash(password: &str) -> Vec<u8> {
    Md4::digest(utf16le(password)).to_vec()
}

fn ntowf_v2(password: &str, user: &str, domain: &str) -> Result<Vec<u8>, SharePointError> {
    let identity = utf16le(&format!("{}{}", user.to_uppercase(), domain));
    hmac_md5(&nt_hash(password), &identity)
}

fn lm_v2_response(
    key: &[u8],
    server_challenge: &[u8; 8],
    client_challenge: &[u8; 8],
) -> Result<Vec<u8>, SharePointError> {
    let proof = hmac_md5(key, &[&server_challenge[..], &client_challenge[..]].concat())?;
    Ok([&proof[..], &client_challenge[..]].concat())
}

fn hmac_md5(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SharePointError> {
    let mut mac = <Hmac<Md5> as Mac>::new_from_slice(key)
        .map_err(|e| SharePointError::Auth(format!("NTLM key error: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn utf16le(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn filetime_now() -> u64 {
    let micros = chrono::Utc::now().timestamp_micros().max(0) as u64;
    (micros + FILETIME_UNIX_OFFSET_SECS * 1_000_000) * 10
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn challenge_message(target_info: &[u8]) -> Vec<u8> {
        let mut msg = Vec::new();
        msg.extend_from_slice(SIGNATURE);
        msg.extend_from_slice(&2u32.to_le_bytes());
        msg.extend_from_slice(&[0u8; 8]); // target name
        msg.extend_from_slice(&0xE28A_8235u32.to_le_bytes());
        msg.extend_from_slice(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        msg.extend_from_slice(&[0u8; 8]); // reserved
        let len = target_info.len() as u16;
        msg.extend_from_slice(&len.to_le_bytes());
        msg.extend_from_slice(&len.to_le_bytes());
        msg.extend_from_slice(&48u32.to_le_bytes());
        msg.extend_from_slice(target_info);
        msg
    }

    #[test]
    fn nt_hash_of_password() {
        assert_eq!(hex(&nt_hash("Password")), "a4f49c406510bdcab6824ee7c30fd852");
    }

    #[test]
    fn ntowf_v2_of_user_and_domain() {
        assert_eq!(
            hex(&ntowf_v2("Password", "User", "Domain").unwrap()),
            "0c868a403bfd7a93a3001ef22ef02e3f"
        );
    }

    #[test]
    fn lm_v2_of_known_challenges() {
        let key = ntowf_v2("Password", "User", "Domain").unwrap();
        let response = lm_v2_response(
            &key,
            &[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef],
            &[0xaa; 8],
        )
        .unwrap();
        assert_eq!(hex(&response), "86c35097ac9cec102554764a57cccc19aaaaaaaaaaaaaaaa");
    }

    #[test]
    fn splits_domain_from_username() {
        let creds = NtlmCreds::new("CORP\\jdoe", "pw");
        assert_eq!(creds.domain, "CORP");
        assert_eq!(creds.user, "jdoe");

        let creds = NtlmCreds::new("jdoe@corp.example", "pw");
        assert_eq!(creds.domain, "");
        assert_eq!(creds.user, "jdoe@corp.example");
        assert!(!format!("{creds:?}").contains("pw\""));
    }

    #[test]
    fn negotiate_header_is_type_one() {
        let creds = NtlmCreds::new("u", "p");
        let header = creds.negotiate_header();
        let raw = STANDARD.decode(header.strip_prefix("NTLM ").unwrap()).unwrap();
        assert_eq!(&raw[..8], SIGNATURE);
        assert_eq!(read_u32(&raw, 8), 1);
        assert_eq!(read_u32(&raw, 12), NEGOTIATE_FLAGS);
    }

    #[test]
    fn parses_challenge_and_timestamp() {
        let mut info = Vec::new();
        info.extend_from_slice(&MSV_AV_TIMESTAMP.to_le_bytes());
        info.extend_from_slice(&8u16.to_le_bytes());
        info.extend_from_slice(&42u64.to_le_bytes());
        info.extend_from_slice(&[0u8; 4]);

        let challenge = Challenge::parse(&challenge_message(&info)).unwrap();
        assert_eq!(challenge.server_challenge, [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        assert_eq!(challenge.target_info, info);
        assert_eq!(challenge.timestamp(), Some(42));

        let challenge = Challenge::parse(&challenge_message(&[])).unwrap();
        assert_eq!(challenge.timestamp(), None);

        assert!(Challenge::parse(b"NTLMSSP\0\x01\0\0\0").is_err());
    }

    #[test]
    fn authenticate_message_layout() {
        let creds = NtlmCreds::new("Domain\\User", "Password");
        let challenge = Challenge::parse(&challenge_message(&[])).unwrap();
        let msg = creds.authenticate_message(&challenge, [0xaa; 8], 0).unwrap();

        assert_eq!(&msg[..8], SIGNATURE);
        assert_eq!(read_u32(&msg, 8), 3);

        // LM response comes first in the payload
        assert_eq!(read_u16(&msg, 12), 24);
        assert_eq!(read_u32(&msg, 16), AUTHENTICATE_HEADER_LEN as u32);
        let lm = &msg[64..88];
        assert_eq!(hex(lm), "86c35097ac9cec102554764a57cccc19aaaaaaaaaaaaaaaa");

        // NT response: 16 byte proof + 28 byte blob + empty target info + 4 zero bytes
        let nt_len = read_u16(&msg, 20) as usize;
        assert_eq!(nt_len, 16 + 28 + 4);

        let user_len = read_u16(&msg, 36) as usize;
        let user_offset = read_u32(&msg, 40) as usize;
        assert_eq!(&msg[user_offset..user_offset + user_len], &utf16le("User")[..]);
    }

    #[test]
    fn extracts_challenge_token() {
        assert_eq!(challenge_token("NTLM abc="), Some("abc="));
        assert_eq!(challenge_token("NTLM"), None);
        assert_eq!(challenge_token("Negotiate abc="), None);
    }

    #[test]
    fn authenticate_header_from_token() {
        let creds = NtlmCreds::new("Domain\\User", "Password");
        let token = STANDARD.encode(challenge_message(&[]));
        let header = creds.authenticate_header(&token).unwrap();
        assert!(header.starts_with("NTLM TlRMTVNTUAADAAAA"));
        assert!(creds.authenticate_header("!!!").is_err());
    }
}
