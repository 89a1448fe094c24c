use crate::dns::answer::{self, Reply};
use crate::error::Error;
use crate::store::SharedStore;
use tracing::error;
use trust_dns_proto::op::{Header, MessageType, OpCode, ResponseCode};
use trust_dns_proto::rr::Name;
use trust_dns_server::authority::MessageResponseBuilder;
use trust_dns_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};

#[derive(Clone)]
pub struct Handler {
    store: SharedStore,
}

impl Handler {
    pub(super) fn new(store: SharedStore) -> Self {
        Handler { store }
    }

    async fn dispatch_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response: R,
    ) -> Result<ResponseInfo, Error> {
        // If it isn't a query, return NOTIMPL.
        if request.op_code() != OpCode::Query || request.message_type() != MessageType::Query {
            return self.handle_notimpl(request, response).await;
        }

        // The request decoder only admits messages with exactly one question.
        let query = request.query();
        // Answers carry the name exactly as asked, not its lowercased form.
        let name: Name = query.original().name().clone();
        let reply = answer::answer_questions(&self.store, [(&name, query.query_type())]).await;
        tracing::debug!(
            "{} {} query for \"{name}\" from {}: {}",
            request.protocol(),
            query.query_type(),
            request.src(),
            reply.response_code
        );
        self.send_reply(request, response, reply).await
    }

    async fn handle_notimpl<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> Result<ResponseInfo, Error> {
        let response = MessageResponseBuilder::from_message_request(request);
        Ok(response_handle
            .send_response(response.error_msg(request.header(), ResponseCode::NotImp))
            .await?)
    }

    async fn send_reply<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
        reply: Reply,
    ) -> Result<ResponseInfo, Error> {
        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);
        header.set_response_code(reply.response_code);
        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build(header, reply.answers.iter(), &[], &[], &[]);
        Ok(response_handle.send_response(response).await?)
    }
}

#[async_trait::async_trait]
impl RequestHandler for Handler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        match self.dispatch_request(request, response_handle).await {
            Ok(info) => info,
            Err(error) => {
                error!("error in RequestHandler: {:?}", error);
                let mut header = Header::new();
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}
