use actix_web::web;
use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;

pub struct NewSubscriber {
    pub email: SubscriberEmail,
}

#[derive(Deserialize, Debug)]
pub struct NewSubscriberBody {
    pub email: Option<String>,
}

impl TryFrom<web::Json<NewSubscriberBody>> for NewSubscriber {
    type Error = String;

    fn try_from(body: web::Json<NewSubscriberBody>) -> Result<Self, Self::Error> {
        let email = body
            .into_inner()
            .email
            .ok_or_else(|| String::from("email is required"))?;
        let email = SubscriberEmail::parse(email)?;

        Ok(NewSubscriber { email })
    }
}
