use crate::ticket::{RequestStatus, Ticket};

/// Counts shown on the support dashboard, reduced from the loaded list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketStats {
    pub pending: usize,
    pub in_process: usize,
    pub done: usize,
    pub unviewed: usize,
}

impl TicketStats {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        tickets.iter().fold(Self::default(), |mut acc, t| {
            match t.status {
                RequestStatus::Pending => acc.pending += 1,
                RequestStatus::InProcess => acc.in_process += 1,
                RequestStatus::Done => acc.done += 1,
                RequestStatus::Unknown(_) => {}
            }
            if !t.viewed {
                acc.unviewed += 1;
            }
            acc
        })
    }
}
