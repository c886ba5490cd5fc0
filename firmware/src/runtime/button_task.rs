use super::GESTURE_QUEUE;
use crate::button::{GestureDecoder, next_gesture};
use crate::hw::ExtiButton;
use crate::runner::GestureSender;

#[embassy_executor::task]
pub async fn run(mut button: ExtiButton<'static>, mut decoder: GestureDecoder) -> ! {
    let sender: GestureSender<'static> = GESTURE_QUEUE.sender();
    loop {
        let gesture = next_gesture(&mut button, &mut decoder).await;
        sender.send(gesture).await;
    }
}
