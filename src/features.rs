//! Server feature negotiation
//!
//! After handshake, the endpoint learns which HELLO features the server
//! agreed to and delivers them to the codec as an out-of-band event. The
//! only feature the codec itself interprets is [`ServerFeature::MutationSeqno`],
//! which flips the interpretation of mutation-response extras.

/// Features a server can advertise during handshake
///
/// Values are the HELLO feature codes from the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ServerFeature {
    Datatype = 0x01,
    Tls = 0x02,
    TcpNodelay = 0x03,
    MutationSeqno = 0x04,
    TcpDelay = 0x05,
    Xattr = 0x06,
    Xerror = 0x07,
    SelectBucket = 0x08,
    Snappy = 0x0A,
}

/// The set of features negotiated on a connection
#[derive(Debug, Clone, Default)]
pub struct ServerFeatures {
    features: Vec<ServerFeature>,
}

impl ServerFeatures {
    pub fn new(features: Vec<ServerFeature>) -> Self {
        ServerFeatures { features }
    }

    pub fn contains(&self, feature: ServerFeature) -> bool {
        self.features.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = ServerFeature> + '_ {
        self.features.iter().copied()
    }
}

impl FromIterator<ServerFeature> for ServerFeatures {
    fn from_iter<I: IntoIterator<Item = ServerFeature>>(iter: I) -> Self {
        ServerFeatures {
            features: iter.into_iter().collect(),
        }
    }
}
