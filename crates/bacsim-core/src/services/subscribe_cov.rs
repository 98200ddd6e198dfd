use crate::apdu::ConfirmedServiceChoice;
use crate::encoding::{
    primitives::{decode_ctx_boolean, encode_ctx_boolean, encode_ctx_object_id, encode_ctx_unsigned},
    reader::Reader,
    tag::Tag,
    writer::Writer,
};
use crate::services::{
    decode_optional_ctx_unsigned, decode_required_ctx_object_id, decode_required_ctx_unsigned,
};
use crate::types::ObjectId;
use crate::{DecodeError, EncodeError};

pub const SERVICE_SUBSCRIBE_COV: u8 = ConfirmedServiceChoice::SubscribeCov as u8;

/// SubscribeCOV request.
///
/// A request that carries neither `issue_confirmed_notifications` nor
/// `lifetime_seconds` cancels the subscription. A lifetime of zero means the
/// subscription never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeCovRequest {
    pub subscriber_process_id: u32,
    pub monitored_object_id: ObjectId,
    pub issue_confirmed_notifications: Option<bool>,
    pub lifetime_seconds: Option<u32>,
}

impl SubscribeCovRequest {
    pub fn cancel(subscriber_process_id: u32, monitored_object_id: ObjectId) -> Self {
        Self {
            subscriber_process_id,
            monitored_object_id,
            issue_confirmed_notifications: None,
            lifetime_seconds: None,
        }
    }

    pub const fn is_cancellation(&self) -> bool {
        self.issue_confirmed_notifications.is_none() && self.lifetime_seconds.is_none()
    }

    pub fn encode_after_header(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_unsigned(w, 0, self.subscriber_process_id)?;
        encode_ctx_object_id(w, 1, self.monitored_object_id.raw())?;
        if let Some(issue_confirmed) = self.issue_confirmed_notifications {
            encode_ctx_boolean(w, 2, issue_confirmed)?;
        }
        if let Some(lifetime_seconds) = self.lifetime_seconds {
            encode_ctx_unsigned(w, 3, lifetime_seconds)?;
        }
        Ok(())
    }

    pub fn decode_after_header(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let subscriber_process_id = decode_required_ctx_unsigned(r, 0)?;
        let monitored_object_id = decode_required_ctx_object_id(r, 1)?;

        let mut issue_confirmed_notifications = None;
        if !r.is_empty() {
            let checkpoint = *r;
            match Tag::decode(r)? {
                Tag::Context { tag_num: 2, len } => {
                    issue_confirmed_notifications = Some(decode_ctx_boolean(r, len as usize)?);
                }
                _ => *r = checkpoint,
            }
        }
        let lifetime_seconds = decode_optional_ctx_unsigned(r, 3)?;

        Ok(Self {
            subscriber_process_id,
            monitored_object_id,
            issue_confirmed_notifications,
            lifetime_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SubscribeCovRequest;
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{ObjectId, ObjectType};

    #[test]
    fn subscription_layout() {
        let req = SubscribeCovRequest {
            subscriber_process_id: 7,
            monitored_object_id: ObjectId::new(ObjectType::AnalogInput, 2),
            issue_confirmed_notifications: Some(false),
            lifetime_seconds: Some(600),
        };

        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        req.encode_after_header(&mut w).unwrap();
        assert_eq!(
            w.as_written(),
            &[0x09, 0x07, 0x1C, 0x00, 0x00, 0x00, 0x02, 0x29, 0x00, 0x3A, 0x02, 0x58]
        );

        let mut r = Reader::new(w.as_written());
        let decoded = SubscribeCovRequest::decode_after_header(&mut r).unwrap();
        assert_eq!(decoded, req);
        assert!(!decoded.is_cancellation());
    }

    #[test]
    fn bare_request_is_a_cancellation() {
        let req = SubscribeCovRequest::cancel(7, ObjectId::new(ObjectType::BinaryInput, 0));
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        req.encode_after_header(&mut w).unwrap();
        let mut r = Reader::new(w.as_written());
        let decoded = SubscribeCovRequest::decode_after_header(&mut r).unwrap();
        assert!(decoded.is_cancellation());
        assert_eq!(decoded.monitored_object_id, req.monitored_object_id);
    }

    #[test]
    fn lifetime_without_confirmed_flag() {
        let mut r = Reader::new(&[0x09, 0x01, 0x1C, 0x00, 0x00, 0x00, 0x00, 0x39, 0x05]);
        let decoded = SubscribeCovRequest::decode_after_header(&mut r).unwrap();
        assert_eq!(decoded.issue_confirmed_notifications, None);
        assert_eq!(decoded.lifetime_seconds, Some(5));
    }
}
