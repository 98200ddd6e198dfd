use crate::bip::bvlc::{BvlcFrame, BvlcFunction, BvlcHeader};
use crate::bip::frame::MAX_BIP_FRAME_LEN;
use crate::{DataLink, DataLinkAddress, DataLinkError};
use bacsim_core::encoding::writer::Writer;
use bacsim_core::DecodeError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// BACnet/IP over a UDP socket.
#[derive(Debug, Clone)]
pub struct BacnetIpTransport {
    socket: Arc<UdpSocket>,
}

impl BacnetIpTransport {
    pub async fn bind(bind_addr: SocketAddr) -> Result<Self, DataLinkError> {
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.set_broadcast(true)?;
        log::debug!("bacnet/ip transport bound to {}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DataLinkError> {
        self.socket.local_addr().map_err(DataLinkError::Io)
    }
}

impl DataLink for BacnetIpTransport {
    async fn send(&self, address: DataLinkAddress, payload: &[u8]) -> Result<(), DataLinkError> {
        let function = if address.is_broadcast() {
            BvlcFunction::OriginalBroadcastNpdu
        } else {
            BvlcFunction::OriginalUnicastNpdu
        };

        let mut frame = [0u8; MAX_BIP_FRAME_LEN];
        let mut w = Writer::new(&mut frame);
        BvlcHeader::wrap(function, &mut w, |w| w.write_all(payload))
            .map_err(|_| DataLinkError::FrameTooLarge)?;

        self.socket
            .send_to(w.as_written(), address.as_socket_addr())
            .await?;
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, DataLinkAddress), DataLinkError> {
        let mut frame = [0u8; MAX_BIP_FRAME_LEN];
        let (n, src) = self.socket.recv_from(&mut frame).await?;
        let bvlc = BvlcFrame::split(&frame[..n]).map_err(|err| match err.cause {
            DecodeError::Unsupported => {
                DataLinkError::UnsupportedBvlcFunction(frame.get(1).copied().unwrap_or(0))
            }
            _ => DataLinkError::Parse(err),
        })?;

        if bvlc.npdu.len() > buf.len() {
            return Err(DataLinkError::FrameTooLarge);
        }
        buf[..bvlc.npdu.len()].copy_from_slice(bvlc.npdu);

        let peer = match bvlc.forwarded_from {
            Some(origin) => SocketAddr::V4(origin),
            None => src,
        };
        Ok((bvlc.npdu.len(), DataLinkAddress::Ip(peer)))
    }
}

#[cfg(test)]
mod tests {
    use super::BacnetIpTransport;
    use crate::bip::bvlc::{BvlcFunction, BvlcHeader, BVLC_TYPE_BIP};
    use crate::{DataLink, DataLinkAddress, DataLinkError};
    use bacsim_core::encoding::{reader::Reader, writer::Writer};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use tokio::net::UdpSocket;

    fn localhost() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn unicast_send_is_wrapped_in_original_unicast() {
        let transport = BacnetIpTransport::bind(localhost()).await.unwrap();
        let peer = UdpSocket::bind(localhost()).await.unwrap();

        transport
            .send(peer.local_addr().unwrap().into(), &[0x01, 0x00, 0x10, 0x08])
            .await
            .unwrap();

        let mut recv = [0u8; 64];
        let (n, src) = peer.recv_from(&mut recv).await.unwrap();
        assert_eq!(src, transport.local_addr().unwrap());
        let mut r = Reader::new(&recv[..n]);
        let hdr = BvlcHeader::decode(&mut r).unwrap();
        assert_eq!(hdr.function, BvlcFunction::OriginalUnicastNpdu);
        assert_eq!(hdr.length as usize, n);
        assert_eq!(r.read_rest(), &[0x01, 0x00, 0x10, 0x08]);
    }

    #[tokio::test]
    async fn recv_strips_bvlc() {
        let transport = BacnetIpTransport::bind(localhost()).await.unwrap();
        let sender = UdpSocket::bind(localhost()).await.unwrap();
        sender
            .send_to(
                &[BVLC_TYPE_BIP, 0x0B, 0x00, 0x06, 0x01, 0x00],
                transport.local_addr().unwrap(),
            )
            .await
            .unwrap();

        let mut out = [0u8; 16];
        let (n, src) = transport.recv(&mut out).await.unwrap();
        assert_eq!(&out[..n], &[0x01, 0x00]);
        assert_eq!(src, DataLinkAddress::Ip(sender.local_addr().unwrap()));
    }

    #[tokio::test]
    async fn recv_forwarded_npdu_returns_forwarded_origin() {
        let transport = BacnetIpTransport::bind(localhost()).await.unwrap();
        let sender = UdpSocket::bind(localhost()).await.unwrap();

        let mut frame = [0u8; 64];
        let mut w = Writer::new(&mut frame);
        BvlcHeader::wrap(BvlcFunction::ForwardedNpdu, &mut w, |w| {
            w.write_all(&[10, 1, 2, 3])?;
            w.write_be_u16(47808)?;
            w.write_all(&[1, 2, 3])
        })
        .unwrap();
        sender
            .send_to(w.as_written(), transport.local_addr().unwrap())
            .await
            .unwrap();

        let mut out = [0u8; 16];
        let (n, src) = transport.recv(&mut out).await.unwrap();
        assert_eq!(&out[..n], &[1, 2, 3]);
        assert_eq!(
            src,
            DataLinkAddress::Ip(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)),
                47808
            ))
        );
    }

    #[tokio::test]
    async fn unknown_bvlc_function_errors() {
        let transport = BacnetIpTransport::bind(localhost()).await.unwrap();
        let sender = UdpSocket::bind(localhost()).await.unwrap();
        sender
            .send_to(&[BVLC_TYPE_BIP, 0x99, 0x00, 0x04], transport.local_addr().unwrap())
            .await
            .unwrap();

        let mut out = [0u8; 16];
        let err = transport.recv(&mut out).await.unwrap_err();
        assert!(matches!(err, DataLinkError::UnsupportedBvlcFunction(0x99)));
    }

    #[tokio::test]
    async fn malformed_datagram_is_a_bvlc_parse_error() {
        let transport = BacnetIpTransport::bind(localhost()).await.unwrap();
        let sender = UdpSocket::bind(localhost()).await.unwrap();
        sender
            .send_to(&[0x55, 0x0A, 0x00, 0x04], transport.local_addr().unwrap())
            .await
            .unwrap();

        let mut out = [0u8; 16];
        match transport.recv(&mut out).await.unwrap_err() {
            DataLinkError::Parse(err) => assert_eq!(err.origin, "bvlc"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
