use crate::apdu::{
    ApduType, BacnetError, ComplexAckHeader, ConfirmedRequestHeader, ConfirmedServiceChoice,
    SimpleAck, UnconfirmedRequestHeader, UnconfirmedServiceChoice,
};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::services::{
    cov_notification::CovNotificationRequest,
    i_am::IAmRequest,
    read_property::{ReadPropertyAck, ReadPropertyRequest},
    subscribe_cov::SubscribeCovRequest,
    who_is::WhoIsRequest,
    write_property::WritePropertyRequest,
};
use crate::{DecodeError, EncodeError, ParseError};

const ORIGIN: &str = "apdu";

/// Payload of a confirmed request.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmedService {
    ReadProperty(ReadPropertyRequest),
    WriteProperty(WritePropertyRequest),
    SubscribeCov(SubscribeCovRequest),
    CovNotification(CovNotificationRequest),
}

impl ConfirmedService {
    pub const fn choice(&self) -> ConfirmedServiceChoice {
        match self {
            Self::ReadProperty(_) => ConfirmedServiceChoice::ReadProperty,
            Self::WriteProperty(_) => ConfirmedServiceChoice::WriteProperty,
            Self::SubscribeCov(_) => ConfirmedServiceChoice::SubscribeCov,
            Self::CovNotification(_) => ConfirmedServiceChoice::ConfirmedCovNotification,
        }
    }

    fn encode_after_header(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Self::ReadProperty(req) => req.encode_after_header(w),
            Self::WriteProperty(req) => req.encode_after_header(w),
            Self::SubscribeCov(req) => req.encode_after_header(w),
            Self::CovNotification(req) => req.encode_after_header(w),
        }
    }

    fn decode_after_header(
        choice: ConfirmedServiceChoice,
        r: &mut Reader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(match choice {
            ConfirmedServiceChoice::ReadProperty => {
                Self::ReadProperty(ReadPropertyRequest::decode_after_header(r)?)
            }
            ConfirmedServiceChoice::WriteProperty => {
                Self::WriteProperty(WritePropertyRequest::decode_after_header(r)?)
            }
            ConfirmedServiceChoice::SubscribeCov => {
                Self::SubscribeCov(SubscribeCovRequest::decode_after_header(r)?)
            }
            ConfirmedServiceChoice::ConfirmedCovNotification => {
                Self::CovNotification(CovNotificationRequest::decode_after_header(r)?)
            }
        })
    }
}

/// Payload of an unconfirmed request.
#[derive(Debug, Clone, PartialEq)]
pub enum UnconfirmedService {
    WhoIs(WhoIsRequest),
    IAm(IAmRequest),
    CovNotification(CovNotificationRequest),
}

impl UnconfirmedService {
    pub const fn choice(&self) -> UnconfirmedServiceChoice {
        match self {
            Self::WhoIs(_) => UnconfirmedServiceChoice::WhoIs,
            Self::IAm(_) => UnconfirmedServiceChoice::IAm,
            Self::CovNotification(_) => UnconfirmedServiceChoice::UnconfirmedCovNotification,
        }
    }

    fn encode_after_header(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Self::WhoIs(req) => req.encode_after_header(w),
            Self::IAm(req) => req.encode_after_header(w),
            Self::CovNotification(req) => req.encode_after_header(w),
        }
    }

    fn decode_after_header(
        choice: UnconfirmedServiceChoice,
        r: &mut Reader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(match choice {
            UnconfirmedServiceChoice::WhoIs => Self::WhoIs(WhoIsRequest::decode_after_header(r)?),
            UnconfirmedServiceChoice::IAm => Self::IAm(IAmRequest::decode_after_header(r)?),
            UnconfirmedServiceChoice::UnconfirmedCovNotification => {
                Self::CovNotification(CovNotificationRequest::decode_after_header(r)?)
            }
        })
    }
}

/// A decoded application-layer message.
#[derive(Debug, Clone, PartialEq)]
pub enum Apdu {
    ConfirmedRequest {
        header: ConfirmedRequestHeader,
        service: ConfirmedService,
    },
    UnconfirmedRequest(UnconfirmedService),
    SimpleAck(SimpleAck),
    ComplexAck {
        invoke_id: u8,
        ack: ReadPropertyAck,
    },
    Error(BacnetError),
}

impl Apdu {
    /// A confirmed request with an unsegmented default header.
    pub fn confirmed(invoke_id: u8, service: ConfirmedService) -> Self {
        Self::ConfirmedRequest {
            header: ConfirmedRequestHeader::new(invoke_id, service.choice() as u8),
            service,
        }
    }

    pub fn unconfirmed(service: UnconfirmedService) -> Self {
        Self::UnconfirmedRequest(service)
    }

    pub fn service_name(&self) -> &'static str {
        match self {
            Self::ConfirmedRequest { service, .. } => service.choice().name(),
            Self::UnconfirmedRequest(service) => service.choice().name(),
            Self::SimpleAck(_) => "SimpleACK",
            Self::ComplexAck { .. } => "ComplexACK",
            Self::Error(_) => "Error",
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Self::ConfirmedRequest { header, service } => {
                if header.segmented {
                    return Err(EncodeError::Unsupported);
                }
                ConfirmedRequestHeader {
                    service_choice: service.choice() as u8,
                    ..*header
                }
                .encode(w)?;
                service.encode_after_header(w)
            }
            Self::UnconfirmedRequest(service) => {
                UnconfirmedRequestHeader {
                    service_choice: service.choice() as u8,
                }
                .encode(w)?;
                service.encode_after_header(w)
            }
            Self::SimpleAck(ack) => ack.encode(w),
            Self::ComplexAck { invoke_id, ack } => {
                ComplexAckHeader {
                    invoke_id: *invoke_id,
                    service_choice: ConfirmedServiceChoice::ReadProperty as u8,
                }
                .encode(w)?;
                ack.encode_after_header(w)
            }
            Self::Error(err) => err.encode(w),
        }
    }

    /// Decodes one APDU. Header failures and unknown service choices are
    /// attributed to `apdu`; failures inside a service body name the service.
    pub fn decode(bytes: &[u8]) -> Result<Self, ParseError> {
        let first = *bytes
            .first()
            .ok_or(ParseError::new(ORIGIN, DecodeError::UnexpectedEof))?;
        let apdu_type =
            ApduType::from_u8(first >> 4).ok_or(ParseError::new(ORIGIN, DecodeError::InvalidValue))?;
        let mut r = Reader::new(bytes);

        match apdu_type {
            ApduType::ConfirmedRequest => {
                let header = ConfirmedRequestHeader::decode(&mut r).map_err(ParseError::at(ORIGIN))?;
                if header.segmented {
                    return Err(ParseError::new(ORIGIN, DecodeError::Unsupported));
                }
                let choice = ConfirmedServiceChoice::from_u8(header.service_choice).ok_or(
                    ParseError::new(
                        ORIGIN,
                        DecodeError::UnsupportedService(header.service_choice),
                    ),
                )?;
                let service = ConfirmedService::decode_after_header(choice, &mut r)
                    .map_err(ParseError::at(choice.name()))?;
                Ok(Self::ConfirmedRequest { header, service })
            }
            ApduType::UnconfirmedRequest => {
                let header =
                    UnconfirmedRequestHeader::decode(&mut r).map_err(ParseError::at(ORIGIN))?;
                let choice = UnconfirmedServiceChoice::from_u8(header.service_choice).ok_or(
                    ParseError::new(
                        ORIGIN,
                        DecodeError::UnsupportedService(header.service_choice),
                    ),
                )?;
                let service = UnconfirmedService::decode_after_header(choice, &mut r)
                    .map_err(ParseError::at(choice.name()))?;
                Ok(Self::UnconfirmedRequest(service))
            }
            ApduType::SimpleAck => SimpleAck::decode(&mut r)
                .map(Self::SimpleAck)
                .map_err(ParseError::at(ORIGIN)),
            ApduType::ComplexAck => {
                let header = ComplexAckHeader::decode(&mut r).map_err(ParseError::at(ORIGIN))?;
                if header.service_choice != ConfirmedServiceChoice::ReadProperty as u8 {
                    return Err(ParseError::new(
                        ORIGIN,
                        DecodeError::UnsupportedService(header.service_choice),
                    ));
                }
                let ack = ReadPropertyAck::decode_after_header(&mut r)
                    .map_err(ParseError::at(ConfirmedServiceChoice::ReadProperty.name()))?;
                Ok(Self::ComplexAck {
                    invoke_id: header.invoke_id,
                    ack,
                })
            }
            ApduType::Error => BacnetError::decode(&mut r)
                .map(Self::Error)
                .map_err(ParseError::at(ORIGIN)),
            ApduType::SegmentAck | ApduType::Reject | ApduType::Abort => {
                Err(ParseError::new(ORIGIN, DecodeError::Unsupported))
            }
        }
    }
}
