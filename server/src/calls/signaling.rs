use crate::relay::events::{
    CallAnswer, CallAnswered, CallHangup, CallOffer, IncomingCall, ServerEvent,
};
use crate::relay::Relay;

/// Handle a callUser: relay the offer to the receiver.
///
/// An offline receiver drops the offer and the caller is not told. Two
/// overlapping calls to the same receiver are both relayed.
pub fn call_user(relay: &Relay, offer: CallOffer) -> bool {
    let CallOffer {
        caller_id,
        receiver_id,
        signal_data,
        call_type,
    } = offer;

    tracing::debug!(
        caller_id = %caller_id,
        receiver_id = %receiver_id,
        call_type = %call_type,
        "Relaying call offer"
    );

    let delivered = relay.registry().send_to_user(
        &receiver_id,
        ServerEvent::IncomingCall(IncomingCall {
            caller_id,
            signal_data,
            call_type,
        }),
    );

    if !delivered {
        tracing::debug!(receiver_id = %receiver_id, "Receiver offline, call offer dropped");
    }
    delivered
}

/// Handle an answerCall: relay the answer back to the original caller.
pub fn answer_call(relay: &Relay, answer: CallAnswer) -> bool {
    let delivered = relay.registry().send_to_user(
        &answer.caller_id,
        ServerEvent::CallAnswered(CallAnswered {
            signal_data: answer.signal_data,
        }),
    );

    tracing::debug!(caller_id = %answer.caller_id, delivered, "Call answer relayed");
    delivered
}

/// Handle an endCall: tell the other side the call is over.
pub fn end_call(relay: &Relay, hangup: CallHangup) -> bool {
    let delivered = relay
        .registry()
        .send_to_user(&hangup.receiver_id, ServerEvent::CallEnded);

    tracing::debug!(receiver_id = %hangup.receiver_id, delivered, "Call end relayed");
    delivered
}
