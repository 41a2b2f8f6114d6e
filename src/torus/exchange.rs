//! Message-passing halo exchange.
//!
//! One round per generation: a unit posts all 8 border pieces, then receives
//! until its 8 halo slots are filled. Sends never block (each inbox is an
//! unbounded queue), so the order of the receives cannot deadlock. Messages
//! carry their target slot and generation, so neighbors that appear in more
//! than one direction (P = 1 or P = 4) are still matched correctly.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use log::trace;

use super::block::{Block, Border, HaloAssembler, HaloPacket};
use super::error::{TorusError, TorusResult};
use super::kernel;
use super::topology::{Direction, NeighborSet, UnitId};

/// One border piece in flight from `from` to the unit whose `slot` it fills.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HaloMessage {
    pub generation: u64,
    pub from: UnitId,
    pub slot: Direction,
    pub border: Border,
}

/// What arrives in a unit's inbox.
#[derive(Clone, Debug)]
pub enum Envelope {
    Halo(HaloMessage),
    /// Another participant failed; stop now.
    Abort,
}

/// Point-to-point link between units.
pub trait Transport {
    /// Post `message` to `to`. Must not wait for the receiver.
    fn send(&mut self, to: UnitId, message: HaloMessage) -> TorusResult<()>;

    /// Wait for the next message addressed to this unit.
    fn recv(&mut self) -> TorusResult<HaloMessage>;
}

/// In-process transport: one `mpsc` inbox per unit, and a link to each
/// distinct neighbor (at most 8, fewer when a neighbor repeats on a small
/// torus).
pub struct ChannelTransport {
    unit: UnitId,
    inbox: Receiver<Envelope>,
    peers: Vec<(UnitId, Sender<Envelope>)>,
    timeout: Duration,
}

impl ChannelTransport {
    pub fn new(
        unit: UnitId,
        inbox: Receiver<Envelope>,
        peers: Vec<(UnitId, Sender<Envelope>)>,
        timeout: Duration,
    ) -> Self {
        Self {
            unit,
            inbox,
            peers,
            timeout,
        }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, to: UnitId, message: HaloMessage) -> TorusResult<()> {
        let (_, peer) = self
            .peers
            .iter()
            .find(|(id, _)| *id == to)
            .ok_or(TorusError::UnknownPeer {
                unit: self.unit,
                peer: to,
            })?;
        peer.send(Envelope::Halo(message))
            .map_err(|_| TorusError::PeerDisconnected { unit: self.unit })
    }

    fn recv(&mut self) -> TorusResult<HaloMessage> {
        match self.inbox.recv_timeout(self.timeout) {
            Ok(Envelope::Halo(message)) => Ok(message),
            Ok(Envelope::Abort) => Err(TorusError::Aborted { unit: self.unit }),
            Err(RecvTimeoutError::Timeout) => Err(TorusError::ExchangeTimeout { unit: self.unit }),
            Err(RecvTimeoutError::Disconnected) => {
                Err(TorusError::PeerDisconnected { unit: self.unit })
            }
        }
    }
}

/// Build one transport per unit of `topology`, each linked only to its own
/// neighbors, plus a handle for broadcasting aborts into every inbox.
pub fn channel_mesh(
    topology: &[NeighborSet],
    timeout: Duration,
) -> (Vec<ChannelTransport>, AbortHandle) {
    let (senders, receivers): (Vec<Sender<Envelope>>, Vec<_>) =
        topology.iter().map(|_| mpsc::channel()).unzip();
    let transports = receivers
        .into_iter()
        .zip(topology)
        .enumerate()
        .map(|(u, (inbox, neighbors))| {
            let mut peers: Vec<(UnitId, Sender<Envelope>)> = Vec::with_capacity(8);
            for (_, peer) in neighbors.iter() {
                if peers.iter().all(|(id, _)| *id != peer) {
                    peers.push((peer, senders[peer.index()].clone()));
                }
            }
            ChannelTransport::new(UnitId(u), inbox, peers, timeout)
        })
        .collect();
    (transports, AbortHandle { inboxes: senders })
}

/// Broadcasts `Envelope::Abort` to every unit so the run stops as a whole.
#[derive(Clone)]
pub struct AbortHandle {
    inboxes: Vec<Sender<Envelope>>,
}

impl AbortHandle {
    pub fn abort_all(&self) {
        for inbox in &self.inboxes {
            // A unit that already exited has dropped its inbox; nothing to do.
            let _ = inbox.send(Envelope::Abort);
        }
    }
}

/// Run one halo round for `unit` and return the halo it received.
pub fn exchange<T: Transport>(
    transport: &mut T,
    unit: UnitId,
    neighbors: &NeighborSet,
    block: &Block,
    generation: u64,
) -> TorusResult<HaloPacket> {
    let borders = block.borders();

    // Post every send before the first receive.
    for (direction, peer) in neighbors.iter() {
        let message = HaloMessage {
            generation,
            from: unit,
            slot: direction.reverse(),
            border: borders.facing(direction),
        };
        trace!("gen {generation}: unit {unit} -> unit {peer} as {:?}", message.slot);
        transport.send(peer, message)?;
    }

    let mut assembler = HaloAssembler::new(unit, block.edge());
    while !assembler.is_complete() {
        let message = transport.recv()?;
        if message.generation != generation {
            return Err(TorusError::OutOfStep {
                unit,
                expected: generation,
                got: message.generation,
            });
        }
        if neighbors[message.slot] != message.from {
            return Err(TorusError::MisroutedHalo {
                unit,
                slot: message.slot,
                from: message.from,
            });
        }
        assembler.insert(message.slot, message.border)?;
    }
    Ok(assembler.finish())
}

/// Exchange halos and advance `block` one generation.
pub fn advance<T: Transport>(
    transport: &mut T,
    unit: UnitId,
    neighbors: &NeighborSet,
    block: &Block,
    generation: u64,
) -> TorusResult<Block> {
    let halo = exchange(transport, unit, neighbors, block, generation)?;
    Ok(kernel::update(block, &halo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torus::sync::gather_halo;
    use crate::torus::topology::neighbor_table;

    const TIMEOUT: Duration = Duration::from_secs(2);

    /// Transport that replays a fixed script of incoming messages.
    struct Scripted {
        sent: Vec<(UnitId, HaloMessage)>,
        incoming: Vec<HaloMessage>,
    }

    impl Transport for Scripted {
        fn send(&mut self, to: UnitId, message: HaloMessage) -> TorusResult<()> {
            self.sent.push((to, message));
            Ok(())
        }

        fn recv(&mut self) -> TorusResult<HaloMessage> {
            self.incoming
                .pop()
                .ok_or(TorusError::ExchangeTimeout { unit: UnitId(0) })
        }
    }

    #[test]
    fn single_unit_exchanges_with_itself() {
        let topology = neighbor_table(1);
        let (mut transports, _abort) = channel_mesh(&topology, TIMEOUT);
        let block = Block::new(3, (0..9).collect());

        let halo = exchange(&mut transports[0], UnitId(0), &topology[0], &block, 0).unwrap();
        let gathered = gather_halo(UnitId(0), 3, &topology[0], &[block.borders()]).unwrap();
        assert_eq!(halo, gathered);
    }

    #[test]
    fn corners_are_sent_as_the_neighbors_opposite_corner() {
        let topology = neighbor_table(9);
        let block = Block::new(2, vec![1, 2, 3, 4]);
        let mut transport = Scripted {
            sent: Vec::new(),
            incoming: Vec::new(),
        };
        // No incoming messages: the round fails after posting all sends.
        let result = exchange(&mut transport, UnitId(4), &topology[4], &block, 7);
        assert!(result.is_err());
        assert_eq!(transport.sent.len(), 8);

        let sent_to = |slot: Direction| {
            transport
                .sent
                .iter()
                .find(|(_, m)| m.slot == slot)
                .cloned()
                .unwrap()
        };
        // Own top-left goes to the up-left neighbor (unit 0) as its down-right.
        let (to, message) = sent_to(Direction::DownRight);
        assert_eq!(to, UnitId(0));
        assert_eq!(message.border, Border::Corner(1));
        assert_eq!(message.generation, 7);
        // Own top row goes up (unit 1) as that unit's down edge.
        let (to, message) = sent_to(Direction::Down);
        assert_eq!(to, UnitId(1));
        assert_eq!(message.border, Border::Edge(vec![1, 2]));
        // Own right column goes right (unit 5) as that unit's left edge.
        let (to, message) = sent_to(Direction::Left);
        assert_eq!(to, UnitId(5));
        assert_eq!(message.border, Border::Edge(vec![2, 4]));
        // Own bottom-right goes to unit 8 as its up-left.
        let (to, message) = sent_to(Direction::UpLeft);
        assert_eq!(to, UnitId(8));
        assert_eq!(message.border, Border::Corner(4));
    }

    #[test]
    fn misrouted_halo_is_rejected() {
        let topology = neighbor_table(9);
        let block = Block::empty(2);
        let mut transport = Scripted {
            sent: Vec::new(),
            // Claims to fill the up slot of unit 4 but comes from unit 3.
            incoming: vec![HaloMessage {
                generation: 0,
                from: UnitId(3),
                slot: Direction::Up,
                border: Border::Edge(vec![0, 0]),
            }],
        };
        let err = exchange(&mut transport, UnitId(4), &topology[4], &block, 0).unwrap_err();
        assert_eq!(
            err,
            TorusError::MisroutedHalo {
                unit: UnitId(4),
                slot: Direction::Up,
                from: UnitId(3)
            }
        );
    }

    #[test]
    fn stale_generation_is_rejected() {
        let topology = neighbor_table(9);
        let block = Block::empty(2);
        let mut transport = Scripted {
            sent: Vec::new(),
            incoming: vec![HaloMessage {
                generation: 2,
                from: UnitId(1),
                slot: Direction::Up,
                border: Border::Edge(vec![0, 0]),
            }],
        };
        let err = exchange(&mut transport, UnitId(4), &topology[4], &block, 3).unwrap_err();
        assert_eq!(
            err,
            TorusError::OutOfStep {
                unit: UnitId(4),
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn abort_interrupts_a_waiting_unit() {
        let (mut transports, abort) = channel_mesh(&neighbor_table(4), TIMEOUT);
        abort.abort_all();
        let err = transports[2].recv().unwrap_err();
        assert_eq!(err, TorusError::Aborted { unit: UnitId(2) });
    }

    #[test]
    fn silent_peer_times_out() {
        let (mut transports, _abort) =
            channel_mesh(&neighbor_table(4), Duration::from_millis(20));
        let err = transports[1].recv().unwrap_err();
        assert_eq!(err, TorusError::ExchangeTimeout { unit: UnitId(1) });
    }

    #[test]
    fn transports_link_only_distinct_neighbors() {
        let (transports, _abort) = channel_mesh(&neighbor_table(36), TIMEOUT);
        for (u, transport) in transports.iter().enumerate() {
            assert_eq!(transport.peers.len(), 8, "unit {u}");
        }
        // 2×2 torus: straight neighbors repeat, all diagonals are one unit.
        let (transports, _abort) = channel_mesh(&neighbor_table(4), TIMEOUT);
        let linked: Vec<UnitId> = transports[0].peers.iter().map(|(id, _)| *id).collect();
        assert_eq!(linked, vec![UnitId(3), UnitId(2), UnitId(1)]);
        // A lone unit only talks to itself.
        let (transports, _abort) = channel_mesh(&neighbor_table(1), TIMEOUT);
        assert_eq!(transports[0].peers.len(), 1);
    }

    #[test]
    fn sending_past_the_neighbors_is_rejected() {
        let (mut transports, _abort) = channel_mesh(&neighbor_table(16), TIMEOUT);
        let message = HaloMessage {
            generation: 0,
            from: UnitId(0),
            slot: Direction::Up,
            border: Border::Edge(vec![0, 0]),
        };
        // Unit 10 is two rows and two columns away from unit 0.
        let err = transports[0].send(UnitId(10), message).unwrap_err();
        assert_eq!(
            err,
            TorusError::UnknownPeer {
                unit: UnitId(0),
                peer: UnitId(10)
            }
        );
    }
}
